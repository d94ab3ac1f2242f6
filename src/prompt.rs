use crate::pr::PullRequestSnapshot;

/// Compose the model input: the template, a newline, then the snapshot as
/// compact JSON. The template and the data are not escaped against each other.
pub fn compose(template: &str, snapshot: &PullRequestSnapshot) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(snapshot)?;
    Ok(format!("{template}\n{json}"))
}
