use markdown::Options;

/// Marks the end of the excerpt shown in post listings.
pub const MORE_TAG: &str = "<!-- more -->";

pub struct RenderedBody {
    pub html: String,
    pub excerpt: String,
}

/// Renders a markdown body (GFM) with HTML comments stripped. The excerpt is
/// whatever comes before [`MORE_TAG`], or the whole body without one.
pub fn render_body(md_text: &str) -> Result<RenderedBody, String> {
    let html = render_markdown(md_text)?;
    let excerpt = match md_text.find(MORE_TAG) {
        Some(pos) => render_markdown(&md_text[..pos])?,
        None => html.clone(),
    };
    Ok(RenderedBody { html, excerpt })
}

pub fn render_markdown(md_text: &str) -> Result<String, String> {
    let buf = remove_comments(md_text)?;
    markdown::to_html_with_options(buf.as_str(), &Options::gfm()).map_err(|e| e.reason)
}

pub fn remove_comments(md_post: &str) -> Result<String, String> {
    let mut res: String = String::new();
    let mut slice = Some(md_post);

    let start_comment = "<!--";
    let end_comment = "-->";

    while let Some(block) = slice {
        let md_buf: &str = match block.find(start_comment) {
            Some(start) => {
                let to_render: &str = &block[0..start];

                let next: &str = &block[(start + start_comment.len())..];
                match next.find(end_comment) {
                    Some(end) => {
                        slice = Some(&next[(end + end_comment.len())..]);
                    }
                    None => return Err("Error finding end of comment".to_string()),
                };

                to_render
            }
            None => {
                slice = None;
                block
            }
        };
        res.push_str(md_buf);
    }

    Ok(res)
}
