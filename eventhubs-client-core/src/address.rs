//! Link address construction.
//!
//! Inputs are substituted verbatim. A malformed entity path or partition id yields a
//! malformed address, which the service rejects when the link attaches.

use crate::constants::{CONSUMER_ADDRESS_FORMAT, DESTINATION_ADDRESS_FORMAT};

/// Substitute each `{}` placeholder of `template` with the next argument.
///
/// Arguments are never rescanned, so an argument containing `{}` is copied as-is.
pub(crate) fn render(template: &str, args: &[&str]) -> String {
    let capacity = template.len() + args.iter().map(|a| a.len()).sum::<usize>();
    let mut out = String::with_capacity(capacity);
    let mut args = args.iter();
    let mut pieces = template.split("{}").peekable();

    while let Some(piece) = pieces.next() {
        out.push_str(piece);
        if pieces.peek().is_some() {
            if let Some(arg) = args.next() {
                out.push_str(arg);
            }
        }
    }

    out
}

/// Address a receiver attaches to: `{entity}/ConsumerGroups/{group}/Partitions/{partition}`.
pub fn consumer_address(entity_path: &str, consumer_group: &str, partition_id: &str) -> String {
    render(
        CONSUMER_ADDRESS_FORMAT,
        &[entity_path, consumer_group, partition_id],
    )
}

/// Address a sender attaches to.
///
/// Without a partition (`None` or empty) the service picks one, so the address is the
/// entity path itself.
pub fn destination_address(entity_path: &str, partition_id: Option<&str>) -> String {
    match partition_id {
        Some(partition) if !partition.is_empty() => {
            render(DESTINATION_ADDRESS_FORMAT, &[entity_path, partition])
        }
        _ => entity_path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consumer_address() {
        assert_eq!(
            consumer_address("telemetry", "$default", "3"),
            "telemetry/ConsumerGroups/$default/Partitions/3"
        );

        for (entity, group, partition) in [
            ("a", "b", "c"),
            ("hub/with/slashes", "analytics", "31"),
            ("", "", ""),
        ] {
            assert_eq!(
                consumer_address(entity, group, partition),
                entity.to_string() + "/ConsumerGroups/" + group + "/Partitions/" + partition
            );
        }
    }

    #[test]
    fn test_destination_address_with_partition() {
        assert_eq!(
            destination_address("telemetry", Some("7")),
            "telemetry/Partitions/7"
        );
    }

    #[test]
    fn test_destination_address_without_partition() {
        assert_eq!(destination_address("telemetry", None), "telemetry");
        assert_eq!(destination_address("telemetry", Some("")), "telemetry");
    }

    #[test]
    fn test_render_does_not_rescan_arguments() {
        assert_eq!(render("{}/x/{}", &["{}", "b"]), "{}/x/b");
        assert_eq!(render("no placeholders", &["ignored"]), "no placeholders");
    }
}
