//! The `name=value` output contract of the binary.

use crate::pipeline::TransferOutcome;

/// Render the outputs in their documented order.
#[must_use]
pub fn render(outcome: &TransferOutcome) -> Vec<(&'static str, String)> {
    vec![
        ("status-code", outcome.status_code.to_string()),
        ("content-length", outcome.bytes_transferred.to_string()),
        ("gcs-url", outcome.gs_url.clone()),
        ("generation", outcome.generation.clone()),
        ("object-existed", outcome.object_existed.to_string()),
    ]
}

/// Print the outputs to stdout. Logs go to stderr, so stdout stays
/// machine-readable.
pub fn print(outcome: &TransferOutcome) {
    for (key, value) in render(outcome) {
        println!("{key}={value}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_transfer_renders_all_outputs() {
        let outcome = TransferOutcome {
            status_code: 200,
            bytes_transferred: 95,
            gs_url: "gs://bucket/object".into(),
            generation: "1712345".into(),
            object_existed: false,
        };
        assert_eq!(render(&outcome), vec![
            ("status-code", "200".to_string()),
            ("content-length", "95".to_string()),
            ("gcs-url", "gs://bucket/object".to_string()),
            ("generation", "1712345".to_string()),
            ("object-existed", "false".to_string()),
        ]);
    }

    #[test]
    fn skipped_transfer_renders_zeroes_and_existed_flag() {
        let outcome = TransferOutcome {
            status_code: 0,
            bytes_transferred: 0,
            gs_url: "gs://bucket/object".into(),
            generation: String::new(),
            object_existed: true,
        };
        let rendered = render(&outcome);
        assert_eq!(rendered[0], ("status-code", "0".to_string()));
        assert_eq!(rendered[1], ("content-length", "0".to_string()));
        assert_eq!(rendered[3], ("generation", String::new()));
        assert_eq!(rendered[4], ("object-existed", "true".to_string()));
    }
}
