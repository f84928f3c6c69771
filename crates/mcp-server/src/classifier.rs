use codeclaw_protocol::Session;
use serde::{Deserialize, Serialize};
use std::fmt;

const CORRECTION_SIGNALS: &[&str] = &[
    "wrong",
    "error",
    "that's not",
    "fix",
    "broken",
    "failed",
    "doesn't work",
    "incorrect",
    "bug",
    "not what i",
    "that won't",
    "not right",
];

const DEBUG_TOOLS: &[&str] = &["bash", "python", "execute"];

const REFACTOR_SIGNALS: &[&str] = &[
    "refactor",
    "clean up",
    "rewrite",
    "simplify",
    "restructure",
    "reorganize",
    "consolidate",
];

/// Sessions longer than this with shell use count as iterative builds.
const ITERATIVE_BUILD_MIN_MESSAGES: usize = 8;

/// Overall shape of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrajectoryType {
    CorrectionLoop,
    DebuggingTrace,
    IterativeBuild,
    Refactor,
    SftClean,
}

impl TrajectoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrajectoryType::CorrectionLoop => "correction_loop",
            TrajectoryType::DebuggingTrace => "debugging_trace",
            TrajectoryType::IterativeBuild => "iterative_build",
            TrajectoryType::Refactor => "refactor",
            TrajectoryType::SftClean => "sft_clean",
        }
    }
}

impl fmt::Display for TrajectoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword heuristics over message content and tool use.
pub fn classify_trajectory(session: &Session) -> TrajectoryType {
    let messages = &session.messages;

    let corrected = messages.iter().skip(1).any(|msg| {
        msg.role == "user" && contains_any(&msg.content.to_lowercase(), CORRECTION_SIGNALS)
    });
    if corrected {
        return TrajectoryType::CorrectionLoop;
    }

    let has_debug_tool = messages
        .iter()
        .filter(|msg| msg.role == "assistant")
        .flat_map(|msg| msg.tool_uses.iter())
        .any(|tool_use| DEBUG_TOOLS.contains(&tool_use.tool.to_lowercase().as_str()));
    let has_error_output = messages.iter().any(|msg| {
        let content = msg.content.to_lowercase();
        content.contains("error") || content.contains("traceback")
    });
    if has_debug_tool && has_error_output {
        return TrajectoryType::DebuggingTrace;
    }

    if let Some(first_user) = messages.iter().find(|msg| msg.role == "user") {
        if contains_any(&first_user.content.to_lowercase(), REFACTOR_SIGNALS) {
            return TrajectoryType::Refactor;
        }
    }

    if messages.len() > ITERATIVE_BUILD_MIN_MESSAGES && has_debug_tool {
        return TrajectoryType::IterativeBuild;
    }

    TrajectoryType::SftClean
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeclaw_protocol::Message;

    fn session(messages: Vec<Message>) -> Session {
        Session {
            messages,
            ..Default::default()
        }
    }

    #[test]
    fn correction_after_first_message() {
        let s = session(vec![
            Message::new("user", "add a login form"),
            Message::new("assistant", "done"),
            Message::new("user", "That's wrong, the button is missing"),
        ]);
        assert_eq!(classify_trajectory(&s), TrajectoryType::CorrectionLoop);
    }

    #[test]
    fn first_message_signals_do_not_count_as_correction() {
        let s = session(vec![Message::new("user", "fix the flaky test")]);
        assert_eq!(classify_trajectory(&s), TrajectoryType::SftClean);
    }

    #[test]
    fn shell_plus_error_output_is_debugging() {
        let s = session(vec![
            Message::new("user", "run the suite"),
            Message::new("assistant", "running").with_tool("Bash", "pytest"),
            Message::new("tool_result", "Traceback (most recent call last)"),
        ]);
        assert_eq!(classify_trajectory(&s), TrajectoryType::DebuggingTrace);
    }

    #[test]
    fn refactor_request() {
        let s = session(vec![
            Message::new("user", "Please refactor the parser module"),
            Message::new("assistant", "ok").with_tool("Edit", "src/parser.rs"),
        ]);
        assert_eq!(classify_trajectory(&s), TrajectoryType::Refactor);
    }

    #[test]
    fn long_shell_session_is_iterative_build() {
        let mut messages = vec![Message::new("user", "build the feature")];
        for _ in 0..8 {
            messages.push(Message::new("assistant", "step").with_tool("bash", "make"));
        }
        assert_eq!(classify_trajectory(&session(messages)), TrajectoryType::IterativeBuild);
    }

    #[test]
    fn labels_are_snake_case() {
        assert_eq!(TrajectoryType::SftClean.as_str(), "sft_clean");
        assert_eq!(
            serde_json::to_value(TrajectoryType::DebuggingTrace).unwrap(),
            "debugging_trace"
        );
    }
}
