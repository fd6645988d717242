use super::{DataUri, GeneratedSite, SiteGenerator};
use crate::error::Result;
use crate::security::validate_file_name;
use crate::submission::AttachmentDescriptor;
use async_trait::async_trait;
use std::path::Path;
use tokio::fs;

/// Single-page template: `index.html`, `README.md`, `LICENSE`, plus any
/// attachments supplied as base64 data URIs.
#[derive(Debug, Clone, Default)]
pub struct StaticSiteGenerator;

impl StaticSiteGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Writes every data-URI attachment into `out_dir`; anything else is dropped.
    pub async fn save_attachments(
        &self,
        attachments: &[AttachmentDescriptor],
        out_dir: &Path,
    ) -> Result<Vec<String>> {
        fs::create_dir_all(out_dir).await?;

        let mut saved = Vec::new();
        for attachment in attachments {
            let Some(uri) = DataUri::parse(attachment.url()) else {
                tracing::debug!(name = attachment.name(), "Skipping attachment without data URI");
                continue;
            };

            let name = match validate_file_name(attachment.name()) {
                Ok(name) => name,
                Err(e) => {
                    tracing::warn!(name = attachment.name(), error = %e, "Skipping attachment with unsafe name");
                    continue;
                }
            };

            let bytes = uri.decode()?;
            fs::write(out_dir.join(name), bytes).await?;
            saved.push(name.to_string());
        }

        Ok(saved)
    }
}

#[async_trait]
impl SiteGenerator for StaticSiteGenerator {
    async fn generate(
        &self,
        task: &str,
        brief: &str,
        attachments: &[AttachmentDescriptor],
        target_dir: &Path,
    ) -> Result<GeneratedSite> {
        fs::create_dir_all(target_dir).await?;
        let saved = self.save_attachments(attachments, target_dir).await?;

        fs::write(target_dir.join("index.html"), render_index(task, brief)).await?;
        fs::write(target_dir.join("README.md"), format!("# {}\n\n{}\n", task, brief)).await?;
        fs::write(target_dir.join("LICENSE"), "MIT License\n\nCopyright (c) YEAR\n").await?;

        let mut files = vec![
            "index.html".to_string(),
            "README.md".to_string(),
            "LICENSE".to_string(),
        ];
        files.extend(saved);

        Ok(GeneratedSite { files })
    }
}

fn render_index(task: &str, brief: &str) -> String {
    let task = escape_html(task);
    let brief = escape_html(brief);

    format!(
        r#"<!doctype html>
<html>
  <head><meta charset="utf-8"><title>{task}</title></head>
  <body>
    <h1>{task}</h1>
    <p id="brief">{brief}</p>
    <div id="content">Loading...</div>
    <script>
      const params = new URLSearchParams(location.search);
      const url = params.get("url");
      if (url) {{
        document.getElementById("content").textContent = 'URL: ' + url;
      }} else {{
        document.getElementById("content").textContent = 'No ?url provided, using default attachment.';
      }}
    </script>
  </body>
</html>"#
    )
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
