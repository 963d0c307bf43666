use std::path::Path;

use brainstem::AgentState;

use crate::error::CliError;

/// Print a short summary of a persisted session.
pub fn inspect_state(path: &Path) -> Result<(), CliError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let state: AgentState = serde_json::from_str(&raw)?;

    println!("session:   {}", state.session_id);
    println!("status:    {}", state.status);
    match state.max_steps {
        Some(max) => println!("steps:     {} / {max}", state.step_count),
        None => println!("steps:     {}", state.step_count),
    }
    println!("messages:  {}", state.messages.len());
    println!("events:    {}", state.events.len());
    println!(
        "llm:       {} calls, {} tokens",
        state.usage.llm.api_calls, state.usage.llm.tokens.total
    );
    println!(
        "tools:     {} calls, {} ms",
        state.usage.tools.total_calls, state.usage.tools.total_time_ms
    );
    println!("cost:      {:.6} {}", state.cost.total, state.cost.currency);

    if let Some(interruption) = &state.interruption {
        println!(
            "interrupted: {} (resumable: {})",
            interruption.reason, interruption.can_resume
        );
    }
    if let Some(error) = &state.error {
        println!("error:     {} {}", error.code, error.message);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use brainstem::Message;

    #[test]
    fn test_inspect_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let state = AgentState::new("s1").with_message(Message::user("hi"));
        std::fs::write(&path, serde_json::to_string(&state).unwrap()).unwrap();

        assert!(inspect_state(&path).is_ok());
        assert!(matches!(
            inspect_state(&dir.path().join("missing.json")),
            Err(CliError::Io { .. })
        ));
    }
}
