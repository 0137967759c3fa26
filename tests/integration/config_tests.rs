//! Configuration files on disk

#[cfg(test)]
mod tests {
    use crate::common::{SseBody, UpdateAssertions, decode_all};
    use std::io::Write;
    use tempfile::NamedTempFile;
    use turnstream::{DecodeError, DecoderConfig, FinishReason};

    fn write_config(yaml: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_name_prefixed_profile_from_file() {
        let file = write_config(
            r#"
profile: name-prefixed
candidates:
  - get_weather
  - search
max_continuations: 2
"#,
        );

        let config = DecoderConfig::from_file(file.path()).await.unwrap();
        assert_eq!(config.max_continuations, Some(2));

        let assembler = config.assembler().unwrap();
        let body = SseBody::new()
            .content("search {\"q\": \"tokio\"}")
            .done();
        let updates = decode_all(&assembler, body.response()).await;

        let calls = updates.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "search");
        updates.assert_terminated_with(FinishReason::ToolCalls);
    }

    #[tokio::test]
    async fn test_custom_profile_from_file() {
        let file = write_config(
            r#"
custom_profile:
  name: in-house
  reasoning_fields: [thoughts]
  phase_markers: boundary
max_tool_buffer_bytes: 65536
log_level: debug
"#,
        );

        let config = DecoderConfig::from_file(file.path()).await.unwrap();
        let profile = config.resolve_profile().unwrap();
        assert_eq!(profile.name, "in-house");
        assert_eq!(profile.max_tool_buffer_bytes, 65536);

        let assembler = config.assembler().unwrap();
        let body = SseBody::new()
            .event(crate::common::fixtures::chunk(
                serde_json::json!({ "thoughts": "hmm" }),
                None,
            ))
            .content("ok")
            .done();
        let updates = decode_all(&assembler, body.response()).await;
        assert_eq!(updates.thinking_text(), "hmm");
        assert_eq!(updates.phase_markers(), 1);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = DecoderConfig::from_file("/nonexistent/turnstream.yaml")
            .await
            .unwrap_err();
        assert!(matches!(err, DecodeError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_invalid_yaml() {
        let file = write_config("profile: [unterminated\n");
        let err = DecoderConfig::from_file(file.path()).await.unwrap_err();
        assert!(matches!(err, DecodeError::Configuration(_)));
    }
}
