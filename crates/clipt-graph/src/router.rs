//! Routing functions for the canonical conditional edges

use anyhow::Result;
use clipt_llm::Transcript;

/// Whether the last message asks for at least one tool call
pub fn has_tool_calls(transcript: &Transcript) -> Result<bool> {
    Ok(transcript.last()?.has_tool_calls())
}

/// Route to `tool_target` when the last message carries tool calls,
/// otherwise to `otherwise`.
pub fn route_on_tool_calls(
    tool_target: impl Into<String>,
    otherwise: impl Into<String>,
) -> impl Fn(&Transcript) -> Result<String> + Send + Sync + 'static {
    let tool_target = tool_target.into();
    let otherwise = otherwise.into();

    move |transcript: &Transcript| {
        if has_tool_calls(transcript)? {
            Ok(tool_target.clone())
        } else {
            Ok(otherwise.clone())
        }
    }
}

/// Route to `end_target` when the last message's text contains `marker`,
/// otherwise to `continue_target`.
pub fn route_on_finish_marker(
    marker: impl Into<String>,
    end_target: impl Into<String>,
    continue_target: impl Into<String>,
) -> impl Fn(&Transcript) -> Result<String> + Send + Sync + 'static {
    let marker = marker.into();
    let end_target = end_target.into();
    let continue_target = continue_target.into();

    move |transcript: &Transcript| {
        let finished = transcript
            .last()?
            .text()
            .is_some_and(|text| text.contains(marker.as_str()));

        if finished {
            Ok(end_target.clone())
        } else {
            Ok(continue_target.clone())
        }
    }
}
