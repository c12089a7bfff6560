//! Server-rendered views: Home (upload + results), About and Information.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Html,
};
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::adapters::http::{
    error::report,
    routes::{read_upload, UPLOAD_FIELD},
    state::HttpState,
};
use crate::adapters::render::encode::jpeg_data_uri;
use crate::application::dto::DetectionReport;
use crate::domain::errors::DomainResult;

const SOURCE_URL: &str = "https://github.com/subramanyamrekhandar/Road-Accident-Detection-By-using-AI.git";
const AUTHOR_URL: &str = "https://www.linkedin.com/in/subramanyamrekhandar/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    About,
    Information,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Home, Page::About, Page::Information];

    pub fn title(self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::About => "About",
            Page::Information => "Information",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Page::Home => "/",
            Page::About => "/about",
            Page::Information => "/information",
        }
    }
}

fn layout(active: Page, body: &str) -> Html<String> {
    let mut nav = String::new();
    for page in Page::ALL {
        let class = if page == active { " class=\"active\"" } else { "" };
        nav.push_str(&format!(
            "<li><a href=\"{}\"{}>{}</a></li>",
            page.path(),
            class,
            page.title()
        ));
    }

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Road Accident Detection - {title}</title>
<link rel="stylesheet" href="/style.css">
</head>
<body>
<aside class="sidebar">
<h2>Main Menu</h2>
<ul class="menu">{nav}</ul>
<h3>Contact</h3>
<p class="info">Created by <a href="{author}">Subramanyam Rekhandar</a>.</p>
</aside>
<main>
{body}
</main>
</body>
</html>"#,
        title = active.title(),
        author = AUTHOR_URL,
    ))
}

fn upload_form() -> String {
    format!(
        r#"<h1>Road Accident Detection</h1>
<p>Upload an image to detect accidents.</p>
<form method="post" action="/" enctype="multipart/form-data">
<label for="{field}">Choose an image</label>
<input id="{field}" type="file" name="{field}" accept=".png,.jpg,.jpeg,image/png,image/jpeg" required>
<button type="submit">Detect</button>
</form>"#,
        field = UPLOAD_FIELD
    )
}

pub async fn home() -> Html<String> {
    layout(Page::Home, &upload_form())
}

pub async fn home_upload(State(st): State<HttpState>, multipart: Multipart) -> (StatusCode, Html<String>) {
    let mut body = upload_form();
    let status = match run_upload(&st, multipart).await {
        Ok(html) => {
            body.push_str(&html);
            StatusCode::OK
        }
        Err(e) => {
            let (status, message) = report(&e);
            body.push_str(&format!("<div class=\"error\">{}</div>", encode_text(&message)));
            status
        }
    };
    (status, layout(Page::Home, &body))
}

async fn run_upload(st: &HttpState, multipart: Multipart) -> DomainResult<String> {
    let (filename, data) = read_upload(multipart).await?;
    let report = st.detection.detect_upload(&filename, &data).await?;
    render_report(&report)
}

/// Original image, annotated image, then the table or the empty message.
pub fn render_report(report: &DetectionReport) -> DomainResult<String> {
    let original = jpeg_data_uri(&report.original, 90)?;
    let annotated = jpeg_data_uri(&report.annotated, 90)?;

    let mut html = String::new();
    html.push_str(&figure(&original, "Uploaded Image", &report.filename));
    html.push_str(&figure(&annotated, "Detected Image", &report.filename));

    match report.message() {
        Some(message) => {
            html.push_str(&format!("<p class=\"empty\">{}</p>", encode_text(message)));
        }
        None => {
            html.push_str("<h3>Detected Objects</h3>\n<table class=\"detections\">\n<thead><tr>");
            for col in ["Class", "Confidence", "X_min", "Y_min", "X_max", "Y_max"] {
                html.push_str(&format!("<th>{col}</th>"));
            }
            html.push_str("</tr></thead>\n<tbody>\n");
            for r in &report.records {
                html.push_str(&format!(
                    "<tr><td>{}</td><td>{:.2}</td><td>{:.2}</td><td>{:.2}</td><td>{:.2}</td><td>{:.2}</td></tr>\n",
                    encode_text(&r.class),
                    r.confidence,
                    r.x_min,
                    r.y_min,
                    r.x_max,
                    r.y_max
                ));
            }
            html.push_str("</tbody>\n</table>");
        }
    }
    Ok(html)
}

fn figure(src: &str, caption: &str, filename: &str) -> String {
    format!(
        "<figure><img src=\"{}\" alt=\"{}\"><figcaption>{}</figcaption></figure>\n",
        src,
        encode_double_quoted_attribute(filename),
        caption
    )
}

pub async fn about() -> Html<String> {
    layout(
        Page::About,
        "<h1>About</h1>
<p>This application detects road accidents using a YOLO model.
Upload an image, and the system will highlight any accident-related objects it detects.</p>",
    )
}

pub async fn information(State(st): State<HttpState>) -> Html<String> {
    layout(Page::Information, &information_body(st.catalog.classes()))
}

pub fn information_body(classes: &[String]) -> String {
    format!(
        r#"<h1>Information</h1>
<h3>Supported Classes</h3>
<p class="classes">{classes}</p>
<h3>YOLO Model</h3>
<p>The YOLO model used in this application is trained on custom data.</p>
<h3>Source Code</h3>
<p>You can find the source code on <a href="{url}">GitHub</a>.</p>"#,
        classes = encode_text(&classes.join(", ")),
        url = SOURCE_URL,
    )
}
