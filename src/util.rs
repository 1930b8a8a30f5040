/// Strip the version, classifier and extension from a maven-style identifier.
///
/// `group:artifact:version[:classifier][@ext]` becomes `group:artifact`. Identifiers
/// that are not maven-shaped are returned unchanged.
#[must_use]
pub fn versionless_id(id: &str) -> &str {
    let coords = id.split_once('@').map_or(id, |(coords, _)| coords);
    let mut parts = coords.splitn(3, ':');
    match (parts.next(), parts.next()) {
        (Some(group), Some(artifact)) if !group.is_empty() && !artifact.is_empty() => {
            &coords[..group.len() + 1 + artifact.len()]
        }
        _ => id,
    }
}
