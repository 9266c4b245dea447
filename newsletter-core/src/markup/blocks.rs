//! Event block markup.
//!
//! Blocks reproduce the template's caption layout: flyer image floated right,
//! text column on the left, followed by a dotted divider.

use crate::event::EventRecord;

const MSO: &str = "mso-line-height-rule: exactly;-ms-text-size-adjust: 100%;-webkit-text-size-adjust: 100%;";
const TABLE_RESET: &str = "border-collapse: collapse;mso-table-lspace: 0pt;mso-table-rspace: 0pt;-ms-text-size-adjust: 100%;-webkit-text-size-adjust: 100%;";
const FONT_STACK: &str = "&quot;Helvetica Neue&quot;, Helvetica, Arial, Verdana, sans-serif";

/// Divider placed after every event block.
pub const DIVIDER_HTML: &str = concat!(
    r#"<table border="0" cellpadding="0" cellspacing="0" width="100%" class="mcnDividerBlock" "#,
    r#"style="min-width: 100%;border-collapse: collapse;mso-table-lspace: 0pt;mso-table-rspace: 0pt;"#,
    r#"-ms-text-size-adjust: 100%;-webkit-text-size-adjust: 100%;table-layout: fixed !important;">"#,
    r#"<tbody class="mcnDividerBlockOuter"><tr>"#,
    r#"<td class="mcnDividerBlockInner" style="min-width: 100%;padding: 0px 18px;"#,
    r#"mso-line-height-rule: exactly;-ms-text-size-adjust: 100%;-webkit-text-size-adjust: 100%;">"#,
    r#"<table class="mcnDividerContent" border="0" cellpadding="0" cellspacing="0" width="100%" "#,
    r#"style="min-width: 100%;border-top: 2px dotted #990000;border-collapse: collapse;"#,
    r#"mso-table-lspace: 0pt;mso-table-rspace: 0pt;-ms-text-size-adjust: 100%;-webkit-text-size-adjust: 100%;">"#,
    r#"<tbody><tr><td style="mso-line-height-rule: exactly;-ms-text-size-adjust: 100%;-webkit-text-size-adjust: 100%;">"#,
    r#"<span></span></td></tr></tbody></table>"#,
    r#"</td></tr></tbody></table>"#,
);

/// Escape `&`, `<` and `>` so free text can't break the surrounding tables.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Text escaping plus `"`, for values placed inside attributes.
fn escape_attr(s: &str) -> String {
    escape_html(s).replace('"', "&quot;")
}

fn image_html(image_url: &str) -> String {
    if image_url.is_empty() {
        return String::new();
    }
    format!(
        r#"<img alt="" src="{}" width="264" style="max-width: 1080px;border-radius: 2%;border: 0;height: auto;outline: none;text-decoration: none;-ms-interpolation-mode: bicubic;vertical-align: bottom;" class="mcnImage">"#,
        escape_attr(image_url)
    )
}

fn link_html(link: &str) -> String {
    if link.is_empty() {
        return String::new();
    }
    format!(
        r#"<a href="{}" style="{MSO}color: #0c89e9;font-weight: normal;text-decoration: underline;">{}</a>"#,
        escape_attr(link),
        escape_html(link)
    )
}

/// Markup for a single event, without the trailing divider.
pub fn render_event_block(event: &EventRecord) -> String {
    let location = if event.location.is_empty() {
        String::new()
    } else {
        format!("<strong>{}</strong><br>", escape_html(&event.location))
    };

    format!(
        r#"
<table border="0" cellpadding="0" cellspacing="0" width="100%" class="mcnCaptionBlock" style="{TABLE_RESET}"><tbody class="mcnCaptionBlockOuter"><tr><td class="mcnCaptionBlockInner" valign="top" style="padding: 9px;{MSO}">
<table border="0" cellpadding="0" cellspacing="0" class="mcnCaptionLeftContentOuter" width="100%" style="{TABLE_RESET}"><tbody><tr>
<td valign="top" class="mcnCaptionLeftContentInner" style="padding: 0 9px;{MSO}">
<table align="right" border="0" cellpadding="0" cellspacing="0" class="mcnCaptionLeftImageContentContainer" width="264" style="{TABLE_RESET}float: right;"><tbody><tr>
<td class="mcnCaptionLeftImageContent" align="center" valign="top" style="{MSO}">
{image}
</td></tr></tbody></table>
<table class="mcnCaptionLeftTextContentContainer" align="left" border="0" cellpadding="0" cellspacing="0" width="264" style="{TABLE_RESET}float: left;"><tbody><tr>
<td valign="top" class="mcnTextContent" style="font-family: {FONT_STACK};font-size: 14px;line-height: 150%;text-align: left;{MSO}word-break: break-word;color: #000000;">
<h1 class="null" style="text-align: center;display: block;margin: 0;padding: 0;color: #000000;font-family: 'Helvetica Neue', Helvetica, Arial, Verdana, sans-serif;font-size: 26px;font-style: normal;font-weight: bold;line-height: 125%;letter-spacing: normal;">{title}</h1>
<p style="text-align: left;font-family: {FONT_STACK};font-size: 14px;line-height: 150%;margin: 10px 0;padding: 0;{MSO}color: #000000;">{description}<br><br>{location}<strong>{date}<br>{time}</strong><br><br>{link}</p>
</td></tr></tbody></table>
</td></tr></tbody></table>
</td></tr></tbody></table>
"#,
        image = image_html(&event.image_url),
        title = escape_html(&event.title),
        description = escape_html(&event.description),
        location = location,
        date = escape_html(&event.date_display),
        time = escape_html(&event.time),
        link = link_html(&event.link),
    )
}

/// Every event followed by a divider, in order.
pub fn render_events(events: &[EventRecord]) -> String {
    let mut html = String::new();
    for event in events {
        html.push_str(&render_event_block(event));
        html.push_str(DIVIDER_HTML);
    }
    html
}
