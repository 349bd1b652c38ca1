//! Tenant session lifecycle.
//!
//! Two states: `Unset` (form editable, no data operations) and `Locked`
//! (connection frozen, only run/refresh/view allowed). Scope-changing edits
//! while unset invalidate the cached override and any previously fetched
//! snapshot, so data from one tenant can never bleed into another. Logout
//! clears everything, credentials included, not just the lock flag.

use crate::apibase;
use crate::credentials;
use crate::metrics::SnapshotMetrics;
use crate::urls;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Unset,
    Locked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    BackendUrl,
    InstanceUrl,
    ApiBaseOverride,
    Username,
    Password,
    CompanyId,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::BackendUrl => "backend_url",
            Field::InstanceUrl => "instance_url",
            Field::ApiBaseOverride => "api_base_override",
            Field::Username => "username",
            Field::Password => "password",
            Field::CompanyId => "company_id",
        }
    }
}

/// Mutable connection form, the only thing the user can touch while unset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionForm {
    pub backend_url: String,
    pub instance_url: String,
    pub api_base_override: String,
    pub username: String,
    pub password: String,
    pub company_id: String,
}

impl ConnectionForm {
    /// Passive preview of the API base the lock would use. Allowed in any
    /// state, performs no network calls.
    pub fn effective_api_base(&self) -> String {
        apibase::effective_api_base(&self.instance_url, &self.api_base_override)
    }
}

/// Locked working context. Immutable once built; replaced only via logout.
#[derive(Debug, Clone, PartialEq)]
pub struct TenantConnection {
    pub backend_url: String,
    pub instance_url: String,
    pub api_base_override: String,
    pub derived_api_base: String,
    pub api_base: String,
    pub username: String,
    pub password: String,
    pub company_id: String,
}

impl TenantConnection {
    pub fn effective_username(&self) -> String {
        credentials::effective_identity(&self.username, &self.company_id)
    }

    /// Scope key identifying which tenant's data is on display.
    pub fn scope(&self) -> (String, String) {
        (self.instance_url.clone(), self.company_id.clone())
    }
}

#[derive(Debug, Clone)]
pub struct TransitionError {
    pub msg: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: Field,
    pub msg: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field.as_str(), self.msg)
    }
}

#[derive(Debug, Clone)]
pub enum Event {
    Edit { field: Field, value: String },
    Logout,
}

/// Outcome of the most recent fetch, so "no snapshot yet" renders differently
/// from a snapshot whose counters happen to be zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Ok,
    Empty,
    Error,
}

#[derive(Debug, Clone, Default)]
pub struct TenantSession {
    state: SessionState,
    form: ConnectionForm,
    connection: Option<TenantConnection>,
    snapshot: Option<SnapshotMetrics>,
    last_status: Option<FetchStatus>,
    last_error: Option<String>,
}

impl TenantSession {
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn form(&self) -> &ConnectionForm {
        &self.form
    }

    pub fn connection(&self) -> Option<&TenantConnection> {
        self.connection.as_ref()
    }

    pub fn snapshot(&self) -> Option<&SnapshotMetrics> {
        self.snapshot.as_ref()
    }

    pub fn last_status(&self) -> Option<FetchStatus> {
        self.last_status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Apply a user event. Edits while locked are deliberate no-ops (the UI
    /// disables the fields; the machine enforces it regardless).
    pub fn apply(&mut self, event: Event) -> Result<(), TransitionError> {
        match (self.state, event) {
            (SessionState::Locked, Event::Edit { .. }) => Ok(()),
            (SessionState::Unset, Event::Edit { field, value }) => {
                self.edit(field, value);
                Ok(())
            }
            (_, Event::Logout) => {
                *self = TenantSession::default();
                Ok(())
            }
        }
    }

    fn edit(&mut self, field: Field, value: String) {
        let scope_changing = matches!(field, Field::BackendUrl | Field::InstanceUrl);
        let changed = match field {
            Field::BackendUrl => set_if_changed(&mut self.form.backend_url, value),
            Field::InstanceUrl => set_if_changed(&mut self.form.instance_url, value),
            Field::ApiBaseOverride => set_if_changed(&mut self.form.api_base_override, value),
            Field::Username => set_if_changed(&mut self.form.username, value),
            Field::Password => set_if_changed(&mut self.form.password, value),
            Field::CompanyId => set_if_changed(&mut self.form.company_id, value),
        };
        // Hard invariant: a new backend or instance invalidates the cached
        // override and anything fetched for the old scope.
        if scope_changing && changed {
            self.form.api_base_override.clear();
            self.snapshot = None;
            self.last_status = None;
            self.last_error = None;
        }
    }

    /// Validate the form into a lockable connection. Pure: no network calls,
    /// so callers can (and must) check field errors before probing /health.
    pub fn validate(&self) -> Result<TenantConnection, Vec<ValidationError>> {
        let backend_url = urls::normalize(&self.form.backend_url);
        let instance_url = urls::normalize(&self.form.instance_url);
        let api_base_override = urls::normalize(&self.form.api_base_override);
        let derived_api_base = apibase::derive(&instance_url);
        let api_base = self.form.effective_api_base();
        let username = self.form.username.trim().to_string();

        let mut errors = Vec::new();
        if backend_url.is_empty() {
            errors.push(ValidationError {
                field: Field::BackendUrl,
                msg: "backend URL is required".to_string(),
            });
        } else if urls::host_of(&backend_url).is_empty() {
            errors.push(ValidationError {
                field: Field::BackendUrl,
                msg: "backend URL has no host".to_string(),
            });
        }
        if instance_url.is_empty() {
            errors.push(ValidationError {
                field: Field::InstanceUrl,
                msg: "instance URL is required".to_string(),
            });
        } else if api_base.is_empty() {
            errors.push(ValidationError {
                field: Field::ApiBaseOverride,
                msg: "API base could not be derived; supply an explicit override".to_string(),
            });
        }
        if username.is_empty() {
            errors.push(ValidationError {
                field: Field::Username,
                msg: "username is required".to_string(),
            });
        }
        if self.form.password.is_empty() {
            errors.push(ValidationError {
                field: Field::Password,
                msg: "password is required".to_string(),
            });
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(TenantConnection {
            backend_url,
            instance_url,
            api_base_override,
            derived_api_base,
            api_base,
            username,
            password: self.form.password.clone(),
            company_id: self.form.company_id.trim().to_string(),
        })
    }

    /// Freeze a validated connection. The caller is expected to have run the
    /// backend health probe between `validate` and here.
    pub fn lock(&mut self, conn: TenantConnection) -> Result<(), TransitionError> {
        if self.state == SessionState::Locked {
            return Err(TransitionError { msg: "session already locked".to_string() });
        }
        self.connection = Some(conn);
        self.state = SessionState::Locked;
        self.snapshot = None;
        self.last_status = None;
        self.last_error = None;
        Ok(())
    }

    pub fn set_snapshot(&mut self, metrics: SnapshotMetrics) -> Result<(), TransitionError> {
        self.require_locked("set_snapshot")?;
        self.snapshot = Some(metrics);
        self.last_status = Some(FetchStatus::Ok);
        self.last_error = None;
        Ok(())
    }

    pub fn record_empty(&mut self) -> Result<(), TransitionError> {
        self.require_locked("record_empty")?;
        self.snapshot = None;
        self.last_status = Some(FetchStatus::Empty);
        self.last_error = None;
        Ok(())
    }

    pub fn record_error(&mut self, msg: String) -> Result<(), TransitionError> {
        self.require_locked("record_error")?;
        self.snapshot = None;
        self.last_status = Some(FetchStatus::Error);
        self.last_error = Some(msg);
        Ok(())
    }

    fn require_locked(&self, op: &str) -> Result<(), TransitionError> {
        if self.state != SessionState::Locked {
            return Err(TransitionError { msg: format!("{} requires a locked session", op) });
        }
        Ok(())
    }
}

fn set_if_changed(slot: &mut String, value: String) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}
