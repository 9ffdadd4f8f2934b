//! Plain HTML pages. Each function returns a complete document; values coming
//! from users or storage are escaped before they are interpolated.

use crate::{models::event::Event, services::qr_service::encode_path_segment};

fn layout(title: &str, body: &str) -> String {
    format!(
        concat!(
            "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">",
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">",
            "<title>{}</title></head><body>{}</body></html>"
        ),
        html_escape(title),
        body
    )
}

pub fn home_page() -> String {
    layout(
        "Event media",
        concat!(
            "<h1>Event media</h1>",
            "<p>Collect photos from your guests with a QR code per occasion.</p>",
            "<p><a href=\"/event/create\">Create an event</a></p>"
        ),
    )
}

pub fn create_event_page() -> String {
    layout(
        "Create event",
        concat!(
            "<h1>Create event</h1>",
            "<form method=\"post\" action=\"/event/create\">",
            "<label>Name <input name=\"name\" required></label><br>",
            "<label>Sub-events (comma separated) ",
            "<input name=\"subevents\" value=\"mehndi,nikkah,reception\"></label><br>",
            "<button type=\"submit\">Create</button>",
            "</form>"
        ),
    )
}

pub fn upload_page(event_id: &str, subevent: &str) -> String {
    let action = format!(
        "/upload/{}/{}",
        encode_path_segment(event_id),
        encode_path_segment(subevent)
    );
    let gallery = format!(
        "/gallery/{}/{}",
        encode_path_segment(event_id),
        encode_path_segment(subevent)
    );
    let body = format!(
        concat!(
            "<h1>Upload to {}</h1>",
            "<form method=\"post\" action=\"{}\" enctype=\"multipart/form-data\">",
            "<input type=\"file\" name=\"file\" accept=\"image/*,video/*\" required>",
            "<button type=\"submit\">Upload</button>",
            "</form>",
            "<p><a href=\"{}\">View gallery</a></p>"
        ),
        html_escape(subevent),
        html_escape(&action),
        html_escape(&gallery)
    );
    layout(&format!("Upload · {}", subevent), &body)
}

pub fn gallery_page(event_id: &str, subevent: &str, urls: &[String]) -> String {
    let mut body = format!("<h1>{}</h1>", html_escape(subevent));
    if urls.is_empty() {
        body.push_str("<p>No uploads yet.</p>");
    }
    for url in urls {
        let escaped = html_escape(url);
        body.push_str(&format!(
            "<a href=\"{0}\"><img src=\"{0}\" loading=\"lazy\" width=\"240\"></a>",
            escaped
        ));
    }
    body.push_str(&format!(
        "<p><a href=\"/upload/{}/{}\">Upload more</a></p>",
        html_escape(&encode_path_segment(event_id)),
        html_escape(&encode_path_segment(subevent))
    ));
    layout(&format!("Gallery · {}", subevent), &body)
}

pub fn admin_page(event_id: &str, event: Option<&Event>, qr_images: &[String]) -> String {
    let title = event.map(|e| e.name.as_str()).unwrap_or(event_id);
    let id = encode_path_segment(event_id);

    let mut body = format!("<h1>{}</h1>", html_escape(title));
    body.push_str(&format!(
        "<p>Event id <code>{}</code> · <a href=\"/download/{}.zip\">Download all uploads</a></p>",
        html_escape(event_id),
        html_escape(&id)
    ));

    if let Some(event) = event {
        body.push_str("<ul>");
        for subevent in &event.subevents {
            let sub = encode_path_segment(subevent);
            body.push_str(&format!(
                "<li>{0} · <a href=\"/upload/{1}/{2}\">upload</a> · <a href=\"/gallery/{1}/{2}\">gallery</a></li>",
                html_escape(subevent),
                html_escape(&id),
                html_escape(&sub)
            ));
        }
        body.push_str("</ul>");
    }

    if qr_images.is_empty() {
        body.push_str("<p>No QR codes generated for this event.</p>");
    }
    for image in qr_images {
        let src = image
            .split('/')
            .map(encode_path_segment)
            .collect::<Vec<_>>()
            .join("/");
        body.push_str(&format!(
            "<figure><img src=\"/static/{}\" width=\"240\"><figcaption>{}</figcaption></figure>",
            html_escape(&src),
            html_escape(image.rsplit('/').next().unwrap_or(image))
        ));
    }

    layout(&format!("Admin · {}", title), &body)
}

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
