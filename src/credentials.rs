/// Combined identity string the upstream tenant expects for Basic Auth.
///
/// A username that already carries `@` is assumed fully qualified and is
/// returned unchanged; otherwise a non-empty company id is appended as
/// `USER@COMPANY`. Pure, no trimming surprises: both inputs are trimmed.
pub fn effective_identity(username: &str, company_id: &str) -> String {
    let user = username.trim();
    let company = company_id.trim();
    if !company.is_empty() && !user.contains('@') {
        return format!("{}@{}", user, company);
    }
    user.to_string()
}
