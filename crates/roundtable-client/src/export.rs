//! Transcript export: serialize the accumulated ordered history.
//!
//! Two shapes: a structured JSON document and a line-oriented text
//! transcript. Filtering of viewer messages and timestamp inclusion are
//! caller options — nothing in the core depends on the output format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use roundtable_core::message::Message;

/// Caller-supplied export options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExportOptions {
    /// Prefix each text line with the message's wall-clock time.
    pub include_timestamps: bool,
    /// Keep viewer-authored messages in the output.
    pub include_user_messages: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_timestamps: true,
            include_user_messages: true,
        }
    }
}

/// Structured transcript document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    /// Discussion topic.
    pub topic: String,
    /// When the session started.
    pub started_at: DateTime<Utc>,
    /// Messages in reveal order (post-filtering).
    pub messages: Vec<Message>,
}

/// Serializes session history into transcript documents.
pub struct TranscriptExporter {
    options: ExportOptions,
}

impl TranscriptExporter {
    /// Create an exporter with the given options.
    #[must_use]
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    fn filtered(&self, messages: &[Message]) -> Vec<Message> {
        messages
            .iter()
            .filter(|m| self.options.include_user_messages || !m.is_user())
            .cloned()
            .collect()
    }

    /// Build the structured transcript.
    #[must_use]
    pub fn transcript(
        &self,
        topic: &str,
        started_at: DateTime<Utc>,
        messages: &[Message],
    ) -> Transcript {
        Transcript {
            topic: topic.to_string(),
            started_at,
            messages: self.filtered(messages),
        }
    }

    /// Render the structured transcript as pretty JSON.
    pub fn to_json(
        &self,
        topic: &str,
        started_at: DateTime<Utc>,
        messages: &[Message],
    ) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.transcript(topic, started_at, messages))
    }

    /// Render a line-oriented text transcript.
    #[must_use]
    pub fn to_text(&self, topic: &str, messages: &[Message]) -> String {
        let mut out = format!("Roundtable Discussion\nTopic: {topic}\n\n");
        for msg in self.filtered(messages) {
            let stamp = if self.options.include_timestamps {
                format!("[{}] ", msg.timestamp.format("%H:%M:%S"))
            } else {
                String::new()
            };
            let name = display_name(&msg);
            out.push_str(&format!("{stamp}{name}:\n{}\n\n", msg.text));
        }
        out
    }
}

fn display_name(msg: &Message) -> String {
    if let Some(name) = &msg.speaker_name {
        return name.clone();
    }
    if msg.is_user() {
        "You".to_string()
    } else {
        msg.speaker.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use roundtable_core::ids::ParticipantId;

    fn message(speaker: &str, name: Option<&str>, text: &str, seq: u64) -> Message {
        Message {
            id: None,
            speaker: ParticipantId::new(speaker),
            text: text.into(),
            timestamp: Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap(),
            sequence: seq,
            speaker_name: name.map(Into::into),
        }
    }

    fn history() -> Vec<Message> {
        vec![
            message("sarah", Some("Dr. Sarah Chen"), "CBT works.", 1),
            message("user", None, "What about sleep?", 2),
            message("james", Some("Dr. James Williams"), "Sleep matters.", 3),
        ]
    }

    #[test]
    fn json_transcript_structure() {
        let exporter = TranscriptExporter::new(ExportOptions::default());
        let started = Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap();
        let json = exporter.to_json("anxiety", started, &history()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["topic"], "anxiety");
        assert_eq!(value["messages"].as_array().unwrap().len(), 3);
        assert_eq!(value["messages"][0]["speaker"], "sarah");
        assert!(value["startedAt"].as_str().unwrap().starts_with("2026-03-14"));
    }

    #[test]
    fn text_transcript_with_timestamps() {
        let exporter = TranscriptExporter::new(ExportOptions::default());
        let text = exporter.to_text("anxiety", &history());
        assert!(text.starts_with("Roundtable Discussion\nTopic: anxiety\n\n"));
        assert!(text.contains("[09:26:53] Dr. Sarah Chen:\nCBT works.\n"));
        assert!(text.contains("[09:26:53] You:\nWhat about sleep?\n"));
    }

    #[test]
    fn text_transcript_without_timestamps() {
        let exporter = TranscriptExporter::new(ExportOptions {
            include_timestamps: false,
            include_user_messages: true,
        });
        let text = exporter.to_text("anxiety", &history());
        assert!(!text.contains('['));
        assert!(text.contains("Dr. Sarah Chen:\nCBT works.\n"));
    }

    #[test]
    fn user_messages_can_be_filtered() {
        let exporter = TranscriptExporter::new(ExportOptions {
            include_timestamps: true,
            include_user_messages: false,
        });
        let started = Utc::now();
        let transcript = exporter.transcript("anxiety", started, &history());
        assert_eq!(transcript.messages.len(), 2);
        assert!(transcript.messages.iter().all(|m| !m.is_user()));

        let text = exporter.to_text("anxiety", &history());
        assert!(!text.contains("What about sleep?"));
    }

    #[test]
    fn unnamed_speaker_falls_back_to_id() {
        let exporter = TranscriptExporter::new(ExportOptions::default());
        let text = exporter.to_text("anxiety", &[message("maria", None, "A thought.", 1)]);
        assert!(text.contains("maria:\nA thought.\n"));
    }

    #[test]
    fn empty_history_renders_header_only() {
        let exporter = TranscriptExporter::new(ExportOptions::default());
        let text = exporter.to_text("sleep", &[]);
        assert_eq!(text, "Roundtable Discussion\nTopic: sleep\n\n");
    }
}
