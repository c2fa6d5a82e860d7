//! HTML for the notice form.

use crate::credentials::TokenStatus;
use crate::llm::{ModelPreset, SamplingParams};
use crate::pdf::{RenderedArtifact, FILE_NAME};

/// Banner shown above the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flash {
    Success(String),
    Error(String),
}

/// Text entered on the form, echoed back so a failed submission can be retried.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    pub invitees: String,
    pub office: String,
    pub date: String,
    pub purpose: String,
    pub api_token: String,
}

/// Everything the form page needs to render.
pub struct PageView<'a> {
    pub values: FormValues,
    pub defaults: SamplingParams,
    pub model: ModelPreset,
    /// Present when the token is entered on the form rather than configured.
    pub token_status: Option<TokenStatus>,
    pub flash: Option<Flash>,
    pub document: Option<&'a RenderedArtifact>,
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn sidebar(view: &PageView<'_>) -> String {
    let token_section = match view.token_status {
        Some(status) => {
            let class = if status.is_valid() { "success" } else { "warning" };
            format!(
                r#"<label for="api_token">Enter Replicate API token:</label>
            <input type="password" id="api_token" name="api_token" form="meeting-form" autocomplete="off" value="{}">
            <p class="{}">{}</p>"#,
                html_escape(&view.values.api_token),
                class,
                html_escape(status.message())
            )
        }
        None => String::new(),
    };

    let options: String = ModelPreset::ALL
        .iter()
        .map(|preset| {
            let selected = if *preset == view.model { " selected" } else { "" };
            format!(
                r#"<option value="{0}"{1}>{0}</option>"#,
                preset.label(),
                selected
            )
        })
        .collect();

    format!(
        r#"<aside>
            <h1>Generative AI for LGU Notice of Meeting</h1>
            <p>This generator uses the open-source Llama 2 LLM model from Meta.</p>
            {token_section}
            <h2>Models and parameters</h2>
            <label for="model">Choose a Llama2 model</label>
            <select id="model" name="model" form="meeting-form">{options}</select>
            <label for="temperature">temperature <output id="temperature-value">{temperature}</output></label>
            <input type="range" id="temperature" name="temperature" form="meeting-form" min="0.01" max="1.0" step="0.01" value="{temperature}">
            <label for="top_p">top_p <output id="top_p-value">{top_p}</output></label>
            <input type="range" id="top_p" name="top_p" form="meeting-form" min="0.01" max="1.0" step="0.01" value="{top_p}">
            <label for="max_length">max_length <output id="max_length-value">{max_length}</output></label>
            <input type="range" id="max_length" name="max_length" form="meeting-form" min="32" max="128" step="8" value="{max_length}">
        </aside>"#,
        token_section = token_section,
        options = options,
        temperature = view.defaults.temperature,
        top_p = view.defaults.top_p,
        max_length = view.defaults.max_length,
    )
}

fn flash(flash: &Option<Flash>) -> String {
    match flash {
        Some(Flash::Success(message)) => {
            format!(r#"<p class="success">{}</p>"#, html_escape(message))
        }
        Some(Flash::Error(message)) => {
            format!(r#"<p class="error">{}</p>"#, html_escape(message))
        }
        None => String::new(),
    }
}

fn document(artifact: Option<&RenderedArtifact>) -> String {
    match artifact {
        Some(artifact) => format!(
            r#"<section id="notice">
            <a class="button" href="/{file}" download="{file}">Download Notice of Meeting PDF</a>
            <embed src="{src}" width="700" height="1000" type="application/pdf">
        </section>"#,
            file = FILE_NAME,
            src = artifact.data_uri(),
        ),
        None => String::new(),
    }
}

/// The single form page.
pub fn form_page(view: &PageView<'_>) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Smarter LGU</title>
    <style>{css}</style>
</head>
<body>
    {sidebar}
    <main>
        {flash}
        <form id="meeting-form" method="post" action="/generate">
            <p>Please fill in the details for the meeting notice:</p>
            <label for="invitees">Who are invited to the meeting?</label>
            <input type="text" id="invitees" name="invitees" value="{invitees}">
            <label for="office">Which office is calling the meeting?</label>
            <input type="text" id="office" name="office" value="{office}">
            <label for="date">What is the date of the meeting?</label>
            <input type="date" id="date" name="date" value="{date}" required>
            <label for="purpose">What is the purpose of the meeting?</label>
            <textarea id="purpose" name="purpose" rows="4">{purpose}</textarea>
            <button type="submit" id="submit">Generate Notice</button>
            <p id="busy" hidden>Generating meeting notice...</p>
        </form>
        {document}
        <p>To generate a new notice, simply fill out the form again.</p>
    </main>
    <script>{js}</script>
</body>
</html>"#,
        css = CSS,
        sidebar = sidebar(view),
        flash = flash(&view.flash),
        invitees = html_escape(&view.values.invitees),
        office = html_escape(&view.values.office),
        date = html_escape(&view.values.date),
        purpose = html_escape(&view.values.purpose),
        document = document(view.document),
        js = JS,
    )
}

const CSS: &str = r#"
body { font-family: sans-serif; display: flex; margin: 0; }
aside { width: 18rem; padding: 1rem; background: #f0f2f6; min-height: 100vh; }
main { flex: 1; padding: 1rem 2rem; }
label { display: block; margin-top: 0.75rem; }
input, select, textarea { width: 100%; box-sizing: border-box; }
button, .button { margin-top: 1rem; padding: 0.5rem 1rem; }
.success { color: #1b7f3b; }
.warning { color: #9a6700; }
.error { color: #b42318; }
"#;

const JS: &str = r#"
for (const id of ["temperature", "top_p", "max_length"]) {
    const input = document.getElementById(id);
    const out = document.getElementById(id + "-value");
    input.addEventListener("input", () => { out.textContent = input.value; });
}
document.getElementById("meeting-form").addEventListener("submit", () => {
    document.getElementById("submit").disabled = true;
    document.getElementById("busy").hidden = false;
});
"#;
