//! Output renderers and formatting helpers for CLI commands.

use std::env;
use std::io::{self, ErrorKind, IsTerminal, Write};

use anyhow::anyhow;
use gitpw_api_models::Patch;
use serde::Serialize;
use tracing::debug;
use unicode_width::UnicodeWidthStr;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult, ExternalCommand};
use crate::links::ResolvedLinks;

/// Flattened view of a patch with its links resolved.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub(crate) struct PatchReport {
    pub(crate) id: u64,
    pub(crate) message_id: String,
    pub(crate) date: String,
    pub(crate) name: String,
    pub(crate) submitter: String,
    pub(crate) state: String,
    pub(crate) archived: Option<bool>,
    pub(crate) project: String,
    pub(crate) delegate: String,
    pub(crate) commit_ref: String,
}

impl PatchReport {
    pub(crate) fn new(patch: &Patch, links: &ResolvedLinks) -> Self {
        Self {
            id: patch.id,
            message_id: patch.msgid.clone().unwrap_or_default(),
            date: patch.date.clone().unwrap_or_default(),
            name: patch.name.clone().unwrap_or_default(),
            submitter: links.submitter.display_name(),
            state: patch.state.clone().unwrap_or_default(),
            archived: patch.archived,
            project: links.project.name.clone().unwrap_or_default(),
            delegate: links.delegate.username.clone().unwrap_or_default(),
            commit_ref: patch.commit_ref.clone().unwrap_or_default(),
        }
    }

    /// Ordered `(label, value)` rows for the property table.
    pub(crate) fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ID", self.id.to_string()),
            ("Message ID", self.message_id.clone()),
            ("Date", self.date.clone()),
            ("Name", self.name.clone()),
            ("Submitter", self.submitter.clone()),
            ("State", self.state.clone()),
            ("Archived", format_flag(self.archived)),
            ("Project", self.project.clone()),
            ("Delegate", self.delegate.clone()),
            ("Commit Ref", self.commit_ref.clone()),
        ]
    }
}

pub(crate) fn render_patch_report(report: &PatchReport, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => println!("{}", to_pretty_json(report)?),
        OutputFormat::Table => {
            let rows = report
                .rows()
                .into_iter()
                .map(|(label, value)| vec![label.to_string(), value])
                .collect::<Vec<_>>();
            print!("{}", format_table(&["Property", "Value"], &rows));
        }
    }
    Ok(())
}

pub(crate) fn render_patch_list(patches: &[Patch], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => println!("{}", to_pretty_json(patches)?),
        OutputFormat::Table => {
            print!(
                "{}",
                format_table(&["ID", "Date", "Name", "State", "Archived"], &list_rows(patches))
            );
        }
    }
    Ok(())
}

pub(crate) fn list_rows(patches: &[Patch]) -> Vec<Vec<String>> {
    patches
        .iter()
        .map(|patch| {
            vec![
                patch.id.to_string(),
                patch.date.clone().unwrap_or_default(),
                patch.name.clone().unwrap_or_default(),
                patch.state.clone().unwrap_or_default(),
                format_flag(patch.archived),
            ]
        })
        .collect()
}

fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> CliResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))
}

#[must_use]
pub(crate) fn format_flag(flag: Option<bool>) -> String {
    flag.map(|value| value.to_string()).unwrap_or_default()
}

/// Render rows as a psql-style table:
///
/// ```text
/// +----------+-------+
/// | Property | Value |
/// |----------+-------|
/// | ID       | 42    |
/// +----------+-------+
/// ```
#[must_use]
pub(crate) fn format_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths = headers
        .iter()
        .map(|header| UnicodeWidthStr::width(*header))
        .collect::<Vec<_>>();
    for row in rows {
        for (index, cell) in row.iter().enumerate().take(widths.len()) {
            widths[index] = widths[index].max(UnicodeWidthStr::width(cell.as_str()));
        }
    }

    let mut table = table_border(&widths, '+');
    table.push_str(&table_line(&widths, headers.iter().copied()));
    table.push_str(&table_border(&widths, '|'));
    for row in rows {
        table.push_str(&table_line(&widths, row.iter().map(String::as_str)));
    }
    table.push_str(&table_border(&widths, '+'));
    table
}

fn table_border(widths: &[usize], edge: char) -> String {
    let mut line = String::new();
    line.push(edge);
    for (index, width) in widths.iter().enumerate() {
        if index > 0 {
            line.push('+');
        }
        line.push_str(&"-".repeat(width + 2));
    }
    line.push(edge);
    line.push('\n');
    line
}

fn table_line<'a>(widths: &[usize], mut cells: impl Iterator<Item = &'a str>) -> String {
    let mut line = String::from("|");
    for width in widths {
        let cell = cells.next().unwrap_or("");
        let pad = width.saturating_sub(UnicodeWidthStr::width(cell));
        line.push(' ');
        line.push_str(cell);
        line.push_str(&" ".repeat(pad));
        line.push_str(" |");
    }
    line.push('\n');
    line
}

/// Pager selected from `GIT_PW_PAGER`, then `PAGER`, then `less -FRX`.
///
/// The value is split with shell quoting rules. Returns `None` when paging is
/// disabled (`cat` or an empty value) or the value has unbalanced quotes.
pub(crate) fn pager_command(
    git_pw_pager: Option<String>,
    pager: Option<String>,
) -> Option<ExternalCommand> {
    let configured = git_pw_pager.or(pager);
    let raw = configured.as_deref().unwrap_or("less -FRX");
    let Some(mut parts) = shlex::split(raw) else {
        debug!(pager = raw, "unbalanced quotes in pager command; paging disabled");
        return None;
    };
    if parts.is_empty() {
        return None;
    }
    let program = parts.remove(0);
    if program == "cat" {
        return None;
    }
    Some(ExternalCommand {
        program,
        args: parts,
    })
}

/// Show `text` through a pager when stdout is a terminal, else print it.
pub(crate) async fn page_text(text: &str) -> CliResult<()> {
    let pager = if io::stdout().is_terminal() {
        pager_command(env::var("GIT_PW_PAGER").ok(), env::var("PAGER").ok())
    } else {
        None
    };
    show_text(text, pager, &mut io::stdout()).await
}

/// Feed `text` to `pager`, writing it to `out` when there is no pager or the
/// pager binary does not exist.
pub(crate) async fn show_text(
    text: &str,
    pager: Option<ExternalCommand>,
    out: &mut impl Write,
) -> CliResult<()> {
    if let Some(pager) = pager {
        match pager.run_with_input(text.as_bytes()).await {
            Ok(_) => return Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(pager = %pager.command_line(), "pager not found; printing directly");
            }
            Err(err) => {
                return Err(CliError::failure(anyhow!(
                    "failed to run pager '{}': {err}",
                    pager.command_line()
                )));
            }
        }
    }
    write_output(out, text)
}

fn write_output(out: &mut impl Write, text: &str) -> CliResult<()> {
    match out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::BrokenPipe => Ok(()),
        Err(err) => Err(CliError::failure(anyhow!("failed to write output: {err}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitpw_api_models::{Person, Project, User};

    fn sample_patch() -> Patch {
        Patch {
            id: 42,
            msgid: Some("<42@example.com>".into()),
            date: Some("2024-10-01T10:00:00".into()),
            name: Some("[PATCH] fix".into()),
            state: Some("new".into()),
            archived: Some(false),
            ..Patch::default()
        }
    }

    #[test]
    fn report_rows_follow_fixed_order() {
        let links = ResolvedLinks {
            submitter: Person {
                name: Some("Alice".into()),
                email: Some("alice@example.com".into()),
            },
            project: Project {
                name: Some("Example".into()),
                link_name: None,
            },
            delegate: User::default(),
        };
        let report = PatchReport::new(&sample_patch(), &links);
        let labels = report
            .rows()
            .into_iter()
            .map(|(label, _)| label)
            .collect::<Vec<_>>();
        assert_eq!(
            labels,
            [
                "ID",
                "Message ID",
                "Date",
                "Name",
                "Submitter",
                "State",
                "Archived",
                "Project",
                "Delegate",
                "Commit Ref"
            ]
        );
        let rows = report.rows();
        assert_eq!(rows[4].1, "Alice (alice@example.com)");
        assert_eq!(rows[6].1, "false");
        assert_eq!(rows[8].1, "");
        assert_eq!(rows[9].1, "");
    }

    #[test]
    fn format_table_pads_columns_to_widest_cell() {
        let table = format_table(
            &["Property", "Value"],
            &[
                vec!["ID".into(), "42".into()],
                vec!["Name".into(), "[PATCH] fix".into()],
            ],
        );
        let expected = "\
+----------+-------------+
| Property | Value       |
|----------+-------------|
| ID       | 42          |
| Name     | [PATCH] fix |
+----------+-------------+
";
        assert_eq!(table, expected);
    }

    #[test]
    fn format_table_measures_display_width() {
        let table = format_table(&["Name"], &[vec!["日本".into()]]);
        assert!(table.starts_with("+------+\n"));
        assert!(table.contains("| 日本 |"));
    }

    #[test]
    fn list_rows_render_missing_fields_empty() {
        let rows = list_rows(&[Patch {
            id: 7,
            ..Patch::default()
        }]);
        assert_eq!(
            rows,
            vec![vec![
                "7".to_string(),
                String::new(),
                String::new(),
                String::new(),
                String::new()
            ]]
        );
    }

    #[test]
    fn pager_command_prefers_git_pw_pager() {
        let pager = pager_command(Some("most -s".into()), Some("less".into())).expect("pager");
        assert_eq!(pager.program, "most");
        assert_eq!(pager.args, ["-s"]);

        let quoted =
            pager_command(Some("less -R --prompt='page one'".into()), None).expect("pager");
        assert_eq!(quoted.program, "less");
        assert_eq!(quoted.args, ["-R", "--prompt=page one"]);

        let fallback = pager_command(None, Some("less".into())).expect("pager");
        assert_eq!(fallback.command_line(), "less");

        let default = pager_command(None, None).expect("pager");
        assert_eq!(default.command_line(), "less -FRX");
    }

    #[test]
    fn pager_command_can_be_disabled() {
        assert!(pager_command(Some("cat".into()), None).is_none());
        assert!(pager_command(Some(String::new()), None).is_none());
        assert!(pager_command(Some("less 'unterminated".into()), None).is_none());
    }

    #[tokio::test]
    async fn show_text_prints_directly_without_pager() -> CliResult<()> {
        let mut out = Vec::new();
        show_text("diff --git a/README b/README\n", None, &mut out).await?;
        assert_eq!(out, b"diff --git a/README b/README\n");
        Ok(())
    }

    #[tokio::test]
    async fn show_text_falls_back_when_pager_is_missing() -> CliResult<()> {
        let pager = ExternalCommand {
            program: "git-pw-definitely-missing-pager".to_string(),
            args: vec!["-R".to_string()],
        };
        let mut out = Vec::new();
        show_text("patch body\n", Some(pager), &mut out).await?;
        assert_eq!(out, b"patch body\n");
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn show_text_sends_text_to_pager() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let target = dir.path().join("paged.txt");
        let pager = ExternalCommand {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), format!("cat > '{}'", target.display())],
        };
        let mut out = Vec::new();
        show_text("paged body\n", Some(pager), &mut out)
            .await
            .map_err(|err| anyhow!(err.display_message()))?;

        assert!(out.is_empty());
        assert_eq!(std::fs::read_to_string(&target)?, "paged body\n");
        Ok(())
    }
}
