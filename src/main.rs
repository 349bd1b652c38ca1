use anyhow::{anyhow, Result};
use tokio::time::{sleep, Duration};

use ecgate::client::{Backend, BackendError, HttpBackend, LatestOutcome, RunRequest};
use ecgate::logging::{json_log, json_log_at, obj, v_bool, v_num, v_str, Level};
use ecgate::render;
use ecgate::session::{Event, Field, TenantSession};
use ecgate::state::Config;

fn usage() -> ! {
    eprintln!("usage: ecgate <health|run|latest|watch>");
    eprintln!();
    eprintln!("connection comes from the environment:");
    eprintln!("  BACKEND_URL, INSTANCE_URL, SF_USERNAME, SF_PASSWORD");
    eprintln!("  API_BASE_OVERRIDE, COMPANY_ID (optional)");
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = std::env::args().nth(1).unwrap_or_else(|| "latest".to_string());
    if !matches!(cmd.as_str(), "health" | "run" | "latest" | "watch") {
        usage();
    }
    let cfg = Config::from_env();
    let backend = HttpBackend::new(&cfg)?;

    if cmd == "health" {
        let health = backend.health().await;
        json_log(
            "connect",
            obj(&[("check", v_str("health")), ("ok", v_bool(health.ok)), ("message", v_str(&health.message))]),
        );
        println!("{}", health.message);
        if !health.ok {
            std::process::exit(1);
        }
        return Ok(());
    }

    let mut session = TenantSession::default();
    for (field, value) in [
        (Field::BackendUrl, cfg.backend_url.clone()),
        (Field::InstanceUrl, cfg.instance_url.clone()),
        (Field::ApiBaseOverride, cfg.api_base_override.clone()),
        (Field::Username, cfg.username.clone()),
        (Field::Password, cfg.password.clone()),
        (Field::CompanyId, cfg.company_id.clone()),
    ] {
        session
            .apply(Event::Edit { field, value })
            .map_err(|e| anyhow!(e.msg))?;
    }

    // Field validation comes before any network call.
    let conn = match session.validate() {
        Ok(conn) => conn,
        Err(errors) => {
            for e in &errors {
                eprintln!("invalid connection: {}", e);
            }
            std::process::exit(2);
        }
    };

    let health = backend.health().await;
    json_log(
        "connect",
        obj(&[("check", v_str("health")), ("ok", v_bool(health.ok)), ("message", v_str(&health.message))]),
    );
    if !health.ok {
        return Err(anyhow!("backend health check failed: {}", health.message));
    }

    json_log(
        "session",
        obj(&[
            ("event", v_str("lock")),
            ("instance", v_str(&conn.instance_url)),
            ("api_base", v_str(&conn.api_base)),
            ("derived_api_base", v_str(&conn.derived_api_base)),
            ("company", v_str(&conn.company_id)),
        ]),
    );
    session.lock(conn).map_err(|e| anyhow!(e.msg))?;
    let conn = session
        .connection()
        .cloned()
        .ok_or_else(|| anyhow!("session lock did not produce a connection"))?;

    match cmd.as_str() {
        "run" => {
            let req = RunRequest {
                instance_url: conn.instance_url.clone(),
                api_base_url: conn.api_base.clone(),
                username: conn.effective_username(),
                password: conn.password.clone(),
                company_id: if conn.company_id.is_empty() { None } else { Some(conn.company_id.clone()) },
                timeout: cfg.upstream_timeout_secs,
                verify_ssl: cfg.verify_ssl,
            };
            match backend.run(&req).await {
                Ok(metrics) => {
                    session.set_snapshot(metrics).map_err(|e| anyhow!(e.msg))?;
                    if let Some(m) = session.snapshot() {
                        print!("{}", render::snapshot(m));
                    }
                }
                Err(e) => {
                    let status = e.downcast_ref::<BackendError>().map(|b| b.status).unwrap_or(0);
                    json_log_at(
                        Level::Error,
                        "client",
                        obj(&[("op", v_str("run")), ("status", v_num(status as f64)), ("error", v_str(&e.to_string()))]),
                    );
                    session.record_error(e.to_string()).map_err(|t| anyhow!(t.msg))?;
                    eprintln!("run failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
        "latest" => {
            fetch_latest(&backend, &mut session, &conn).await?;
        }
        "watch" => loop {
            fetch_latest(&backend, &mut session, &conn).await?;
            json_log(
                "client",
                obj(&[("op", v_str("watch")), ("sleep_secs", v_num(cfg.refresh_secs as f64))]),
            );
            sleep(Duration::from_secs(cfg.refresh_secs)).await;
        },
        _ => usage(),
    }

    Ok(())
}

async fn fetch_latest(
    backend: &HttpBackend,
    session: &mut TenantSession,
    conn: &ecgate::session::TenantConnection,
) -> Result<()> {
    match backend.latest(&conn.instance_url, &conn.company_id).await {
        Ok(LatestOutcome::Snapshot(metrics)) => {
            session.set_snapshot(metrics).map_err(|e| anyhow!(e.msg))?;
            if let Some(m) = session.snapshot() {
                print!("{}", render::snapshot(m));
            }
        }
        Ok(LatestOutcome::Empty) => {
            session.record_empty().map_err(|e| anyhow!(e.msg))?;
            println!(
                "No snapshot loaded yet for this instance/company. Run `ecgate run` for a live check."
            );
        }
        Err(e) => {
            let status = e.downcast_ref::<BackendError>().map(|b| b.status).unwrap_or(0);
            json_log_at(
                Level::Error,
                "client",
                obj(&[("op", v_str("latest")), ("status", v_num(status as f64)), ("error", v_str(&e.to_string()))]),
            );
            session.record_error(e.to_string()).map_err(|t| anyhow!(t.msg))?;
            eprintln!("refresh failed: {}", e);
        }
    }
    Ok(())
}
