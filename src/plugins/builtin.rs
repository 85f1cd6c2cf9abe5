//! Plugin kinds shipped with the host

use chrono::Utc;

use crate::application::errors::CommandError;
use crate::domain::entities::{CommandScope, CommandSpec, DeclaredCommands, Invocation, InvocationKind};
use crate::infrastructure::plugins::manifest::{CommandEntry, PluginManifest};
use super::trait_def::Plugin;

/// Replies rendered from the templates in the plugin's manifest.
///
/// `{text}` expands to the command arguments, `{chat}` to the chat id and
/// `{command}` to the invoked command name.
pub struct TemplatePlugin {
    name: String,
    description: String,
    scope: CommandScope,
    app: Vec<CommandEntry>,
    prefix: Vec<CommandEntry>,
}

impl TemplatePlugin {
    pub fn from_manifest(name: impl Into<String>, manifest: &PluginManifest) -> Self {
        Self {
            name: name.into(),
            description: manifest.description.clone().unwrap_or_default(),
            scope: manifest.scope(),
            app: manifest.app_commands.clone(),
            prefix: manifest.prefix_commands.clone(),
        }
    }

    fn entry(&self, invocation: &Invocation) -> Option<&CommandEntry> {
        let entries = match invocation.kind {
            InvocationKind::App => &self.app,
            InvocationKind::Prefix => &self.prefix,
        };
        entries.iter().find(|e| e.name == invocation.command)
    }
}

pub fn render(template: &str, invocation: &Invocation) -> String {
    template
        .replace("{text}", &invocation.text())
        .replace("{chat}", &invocation.chat_id)
        .replace("{command}", &invocation.command)
}

impl Plugin for TemplatePlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn app_commands(&self) -> DeclaredCommands {
        let commands = self
            .app
            .iter()
            .map(|e| CommandSpec::new(&e.name, e.description.clone().unwrap_or_default()))
            .collect();
        DeclaredCommands::new(self.scope, commands)
    }

    fn prefix_commands(&self) -> Vec<String> {
        self.prefix.iter().map(|e| e.name.clone()).collect()
    }

    fn execute(&self, invocation: &Invocation) -> Result<String, CommandError> {
        let entry = self
            .entry(invocation)
            .ok_or_else(|| CommandError::NotFound(invocation.command.clone()))?;

        match &entry.reply {
            Some(reply) => {
                if reply.contains("{text}") && invocation.args.is_empty() {
                    return Err(CommandError::InvalidArgs(format!(
                        "usage: {} <text>",
                        invocation.command
                    )));
                }
                Ok(render(reply, invocation))
            }
            None => Ok(invocation.text()),
        }
    }
}

/// Latency report: time from the platform's message timestamp to handling
pub struct PingPlugin {
    name: String,
    scope: CommandScope,
    app: Vec<CommandEntry>,
}

impl PingPlugin {
    pub fn from_manifest(name: impl Into<String>, manifest: &PluginManifest) -> Self {
        Self {
            name: name.into(),
            scope: manifest.scope(),
            app: manifest.app_commands.clone(),
        }
    }
}

impl Plugin for PingPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Check latency"
    }

    fn app_commands(&self) -> DeclaredCommands {
        let commands = self
            .app
            .iter()
            .map(|e| {
                CommandSpec::new(
                    &e.name,
                    e.description.clone().unwrap_or_else(|| "Check latency".to_string()),
                )
            })
            .collect();
        DeclaredCommands::new(self.scope, commands)
    }

    fn prefix_commands(&self) -> Vec<String> {
        vec!["ping".to_string()]
    }

    fn execute(&self, invocation: &Invocation) -> Result<String, CommandError> {
        let ms = (Utc::now() - invocation.sent_at).num_milliseconds().max(0);
        Ok(format!("Pong! {}ms", ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(yaml: &str) -> PluginManifest {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_template_declares_app_commands_in_scope() {
        let m = manifest(
            r#"
target-group: -100
app-commands:
  - name: sus
    description: sus
    reply: "e {text}"
"#,
        );
        let plugin = TemplatePlugin::from_manifest("sus", &m);
        let declared = plugin.app_commands();
        assert_eq!(declared.scope, CommandScope::Group(-100));
        assert_eq!(declared.commands, vec![CommandSpec::new("sus", "sus")]);
    }

    #[test]
    fn test_template_reply_by_kind() {
        let m = manifest(
            r#"
prefix-commands:
  - name: sus
    reply: "{text}"
app-commands:
  - name: sus
    description: sus
    reply: "e {text}"
"#,
        );
        let plugin = TemplatePlugin::from_manifest("sus", &m);

        let args = vec!["hello".to_string(), "there".to_string()];
        let app = Invocation::new("sus", args.clone(), InvocationKind::App);
        let prefix = Invocation::new("sus", args, InvocationKind::Prefix);

        assert_eq!(plugin.execute(&app).unwrap(), "e hello there");
        assert_eq!(plugin.execute(&prefix).unwrap(), "hello there");
    }

    #[test]
    fn test_template_requires_text_argument() {
        let m = manifest(
            r#"
prefix-commands:
  - name: sus
    reply: "{text}"
"#,
        );
        let plugin = TemplatePlugin::from_manifest("sus", &m);
        let call = Invocation::new("sus", vec![], InvocationKind::Prefix);
        assert!(matches!(plugin.execute(&call), Err(CommandError::InvalidArgs(_))));
    }

    #[test]
    fn test_render_placeholders() {
        let call = Invocation::new("echo", vec!["hi".to_string()], InvocationKind::App).with_chat("42");
        assert_eq!(render("{command}@{chat}: {text}", &call), "echo@42: hi");
    }

    #[test]
    fn test_ping_reports_latency() {
        let plugin = PingPlugin::from_manifest("ping", &manifest("kind: ping"));
        let mut call = Invocation::new("ping", vec![], InvocationKind::Prefix);
        call.sent_at = Utc::now() - chrono::Duration::milliseconds(1500);

        let reply = plugin.execute(&call).unwrap();
        assert!(reply.starts_with("Pong! "));
        let ms: i64 = reply.trim_start_matches("Pong! ").trim_end_matches("ms").parse().unwrap();
        assert!(ms >= 1500);
        assert!(plugin.app_commands().is_empty());
    }
}
