//! `writeback run` command implementation.

use anyhow::Result;
use serde_json::Value;
use writeback_core::{Caller, WritebackConfig};

pub async fn run(
    config: &WritebackConfig,
    action: &str,
    args: Value,
    as_user: Option<String>,
    superuser: bool,
) -> Result<bool> {
    let dispatcher = super::dispatcher(config)?;
    let caller = as_user.map(|id| {
        if superuser {
            Caller::superuser(id)
        } else {
            Caller::new(id)
        }
    });

    match dispatcher.perform_named(action, args, caller.as_ref()).await {
        Ok(result) => {
            super::print_json(&result)?;
            Ok(true)
        }
        Err(err) => {
            tracing::debug!(error = %err, "action failed");
            super::print_json(&err.to_failure())?;
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> WritebackConfig {
        WritebackConfig::from_yaml(
            r#"
resources:
  - id: 2
    name: Sample
    engine: postgres
    settings:
      database-enable-actions: true
    tables:
      - id: 29
        name: people
        rows:
          - { id: 1, name: Alice }
"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn trusted_calls_succeed() {
        let args = json!({"database": 2, "sourceTable": 29, "createRow": {"name": "Bob"}});
        assert!(run(&config(), "row/create", args, None, false).await.unwrap());
    }

    #[tokio::test]
    async fn plain_callers_are_refused() {
        let args = json!({"database": 2, "sourceTable": 29, "createRow": {"name": "Bob"}});
        let ok = run(&config(), "row/create", args.clone(), Some("alice".into()), false)
            .await
            .unwrap();
        assert!(!ok);

        let ok = run(&config(), "row/create", args, Some("root".into()), true)
            .await
            .unwrap();
        assert!(ok);
    }

    #[tokio::test]
    async fn failures_are_reported_not_raised() {
        let ok = run(&config(), "row/delete", json!({"database": 9}), None, false)
            .await
            .unwrap();
        assert!(!ok);
    }
}
