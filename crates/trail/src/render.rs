//! Streaming HTML and JSON audit trail reports.

use std::io::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use minijinja::{Environment, context};
use serde::Serialize;
use serde_json::json;

use rmaudit_core::NodeRef;

use crate::error::TrailError;

/// Fuel limit for `MiniJinja` template evaluation, per rendered fragment.
const FUEL_LIMIT: u64 = 100_000;

const HEADER_TEMPLATE_NAME: &str = "header.html";
const ENTRY_TEMPLATE_NAME: &str = "entry.html";

const HEADER_TEMPLATE: &str = r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Strict//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd">
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
<title>{{ title }}</title></head>
<style>
body { font-family: arial,verdana; font-size: 81%; color: #333; }
.label { margin-right: 5px; font-weight: bold; }
.value { margin-right: 40px; }
.audit-info { background-color: #efefef; padding: 10px; margin-bottom: 4px; }
.audit-entry { border: 1px solid #bbb; margin-top: 15px; }
.audit-entry-header { background-color: #bbb; padding: 8px; }
.audit-entry-node { padding: 10px; }
.changed-values-table { margin-left: 6px; margin-bottom: 2px;width: 99%; }
.changed-values-table th { text-align: left; background-color: #eee; padding: 4px; }
.changed-values-table td { width: 33%; padding: 4px; border-top: 1px solid #eee; }
</style>
<body>
<h2>{{ title }}</h2>
<div class="audit-info">
{% for field in fields %}<span class="label">{{ field.label }}:</span><span class="value">{{ field.value }}</span>{% endfor %}
</div>
"#;

const ENTRY_TEMPLATE: &str = r#"<div class="audit-entry">
<div class="audit-entry-header">{% for field in header %}<span class="label">{{ field.label }}:</span><span class="value">{{ field.value }}</span>{% endfor %}
</div>
<div class="audit-entry-node">{% for field in node %}<span class="label">{{ field.label }}:</span><span class="value">{{ field.value }}</span>{% endfor %}</div>
{% if changes %}<table class="changed-values-table" cellspacing="0"><tr><th>Property</th><th>Previous Value</th><th>New Value</th></tr>
{%- for change in changes %}<tr><td>{{ change.name }}</td><td>{% if change.previous is none %}&lt;none&gt;{% else %}{{ change.previous }}{% endif %}</td><td>{% if change.new is none %}&lt;none&gt;{% else %}{{ change.new }}{% endif %}</td></tr>{% endfor %}</table>
{% endif %}</div>"#;

const HTML_FOOTER: &str = "\n</body></html>";
const JSON_FOOTER: &str = "\n\t\t]\n\t}\n}";

/// Locations are shown relative to this path segment.
const SITES_PATH: &str = "/Sites";

/// Output encoding of an audit trail report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Html,
    Json,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Json => "json",
        }
    }

    pub fn mimetype(self) -> &'static str {
        match self {
            Self::Html => "text/html",
            Self::Json => "application/json",
        }
    }
}

/// Query description written at the top of a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportHeader {
    pub title: String,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    /// Label of the property filter.
    pub property: Option<String>,
    pub user: Option<String>,
    /// Label of the event filter.
    pub event: Option<String>,
    /// Start of the reported period.
    pub started: DateTime<Utc>,
    /// End of the reported period.
    pub stopped: DateTime<Utc>,
    /// Whether records-management auditing is currently on.
    pub enabled: bool,
}

/// How clients may link to an entry's node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NodeLink {
    #[default]
    Node,
    /// The node is a person created by the event.
    CreatePerson,
    /// The node cannot be navigated to (deleted, or an authority).
    Unavailable,
}

/// One changed property, rendered to display strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangedValue {
    /// Property label.
    pub name: String,
    pub previous: Option<String>,
    pub new: Option<String>,
}

/// An audit entry with every label resolved, ready to be written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryView {
    pub timestamp: DateTime<Utc>,
    pub user_name: Option<String>,
    pub full_name: Option<String>,
    pub user_role: Option<String>,
    pub node: Option<NodeRef>,
    pub node_name: Option<String>,
    pub link: NodeLink,
    /// Node type title.
    pub node_type: Option<String>,
    /// Event label.
    pub event: Option<String>,
    pub identifier: Option<String>,
    pub path: Option<String>,
    pub changes: Vec<ChangedValue>,
}

#[derive(Serialize)]
struct Field<'a> {
    label: &'static str,
    value: &'a str,
}

fn iso(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn display_date(date: DateTime<Utc>) -> String {
    date.format("%a %b %d %H:%M:%S UTC %Y").to_string()
}

/// The part of `path` after the sites root, or the whole path.
pub fn display_location(path: &str) -> &str {
    path.find(SITES_PATH)
        .map_or(path, |idx| &path[idx + SITES_PATH.len()..])
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

/// Writes a report incrementally: header, entries, footer.
pub struct ReportWriter<W: Write> {
    out: W,
    format: ReportFormat,
    env: Environment<'static>,
    first_entry: bool,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(out: W, format: ReportFormat) -> Result<Self, TrailError> {
        let mut env = Environment::new();
        env.set_fuel(Some(FUEL_LIMIT));
        env.set_keep_trailing_newline(true);
        env.add_template(HEADER_TEMPLATE_NAME, HEADER_TEMPLATE)?;
        env.add_template(ENTRY_TEMPLATE_NAME, ENTRY_TEMPLATE)?;
        Ok(Self {
            out,
            format,
            env,
            first_entry: true,
        })
    }

    pub fn format(&self) -> ReportFormat {
        self.format
    }

    pub fn write_header(&mut self, header: &ReportHeader) -> Result<(), TrailError> {
        match self.format {
            ReportFormat::Html => {
                const NOT_SET: &str = "<Not Set>";
                const ALL: &str = "All";
                let from = header.date_from.map(display_date);
                let to = header.date_to.map(display_date);
                let fields = [
                    Field {
                        label: "From",
                        value: from.as_deref().unwrap_or(NOT_SET),
                    },
                    Field {
                        label: "To",
                        value: to.as_deref().unwrap_or(NOT_SET),
                    },
                    Field {
                        label: "Property",
                        value: header.property.as_deref().unwrap_or(ALL),
                    },
                    Field {
                        label: "User",
                        value: header.user.as_deref().unwrap_or(ALL),
                    },
                    Field {
                        label: "Event",
                        value: header.event.as_deref().unwrap_or(ALL),
                    },
                ];
                let html = self
                    .env
                    .get_template(HEADER_TEMPLATE_NAME)?
                    .render(context! { title => &header.title, fields => fields })?;
                self.out.write_all(html.as_bytes())?;
            }
            ReportFormat::Json => {
                write!(
                    self.out,
                    "{{\n\t\"data\":\n\t{{\n\t\t\"started\": \"{}\",\n\t\t\"stopped\": \"{}\",\n\t\t\"enabled\": {},\n\t\t\"entries\":[",
                    iso(header.started),
                    iso(header.stopped),
                    header.enabled
                )?;
            }
        }
        Ok(())
    }

    pub fn write_entry(&mut self, entry: &EntryView) -> Result<(), TrailError> {
        if self.first_entry {
            self.first_entry = false;
        } else {
            let separator = match self.format {
                ReportFormat::Html => "\n",
                ReportFormat::Json => ",",
            };
            self.out.write_all(separator.as_bytes())?;
        }

        match self.format {
            ReportFormat::Html => {
                let html = self.html_entry(entry)?;
                self.out.write_all(html.as_bytes())?;
            }
            ReportFormat::Json => {
                self.out.write_all(b"\n\t\t")?;
                let json = serde_json::to_string(&json_entry(entry))
                    .map_err(TrailError::report)?;
                self.out.write_all(json.as_bytes())?;
            }
        }
        Ok(())
    }

    pub fn write_footer(&mut self) -> Result<(), TrailError> {
        let footer = match self.format {
            ReportFormat::Html => HTML_FOOTER,
            ReportFormat::Json => JSON_FOOTER,
        };
        self.out.write_all(footer.as_bytes())?;
        Ok(())
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(mut self) -> Result<W, TrailError> {
        self.out.flush()?;
        Ok(self.out)
    }

    fn html_entry(&self, entry: &EntryView) -> Result<String, TrailError> {
        let timestamp = display_date(entry.timestamp);
        let user = entry
            .full_name
            .as_deref()
            .or(entry.user_name.as_deref())
            .unwrap_or_default();

        let mut header = vec![
            Field {
                label: "Timestamp",
                value: &timestamp,
            },
            Field {
                label: "User",
                value: user,
            },
        ];
        if let Some(role) = non_empty(entry.user_role.as_ref()) {
            header.push(Field {
                label: "Role",
                value: role,
            });
        }
        if let Some(event) = non_empty(entry.event.as_ref()) {
            header.push(Field {
                label: "Event",
                value: event,
            });
        }

        let mut node = Vec::new();
        if let Some(identifier) = non_empty(entry.identifier.as_ref()) {
            node.push(Field {
                label: "Identifier",
                value: identifier,
            });
        }
        if let Some(node_type) = non_empty(entry.node_type.as_ref()) {
            node.push(Field {
                label: "Type",
                value: node_type,
            });
        }
        if let Some(path) = non_empty(entry.path.as_ref()) {
            node.push(Field {
                label: "Location",
                value: display_location(path),
            });
        }

        let html = self.env.get_template(ENTRY_TEMPLATE_NAME)?.render(context! {
            header => header,
            node => node,
            changes => &entry.changes,
        })?;
        Ok(html)
    }
}

fn json_entry(entry: &EntryView) -> serde_json::Value {
    let text = |value: &Option<String>| value.clone().unwrap_or_default();

    let changed_values: Vec<serde_json::Value> = entry
        .changes
        .iter()
        .map(|change| {
            json!({
                "name": change.name,
                "previous": text(&change.previous),
                "new": text(&change.new),
            })
        })
        .collect();

    let mut json = json!({
        "timestamp": iso(entry.timestamp),
        "userRole": text(&entry.user_role),
        "fullName": text(&entry.full_name),
        "nodeRef": entry.node.as_ref().map(ToString::to_string).unwrap_or_default(),
        "nodeName": text(&entry.node_name),
        "nodeType": text(&entry.node_type),
        "event": text(&entry.event),
        "identifier": text(&entry.identifier),
        "path": text(&entry.path),
        "changedValues": changed_values,
    });
    if let Some(user_name) = &entry.user_name {
        json["userName"] = json!(user_name);
    }
    match entry.link {
        NodeLink::Node => {}
        NodeLink::CreatePerson => json["createPerson"] = json!(true),
        NodeLink::Unavailable => json["noAvailableLink"] = json!(true),
    }
    json
}
