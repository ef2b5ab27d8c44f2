//! Composition of the giver's assignment notification.
//!
//! Produces a plain-text subject and body. Delivery is the notifier's job;
//! this module only decides what the giver reads.

/// Subject and body of an outgoing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedMessage {
    pub subject: String,
    pub body: String,
}

/// The receiver fields shown to the giver.
#[derive(Debug, Clone, Copy)]
pub struct ReceiverDetails<'a> {
    pub name: &'a str,
    pub gift_idea: Option<&'a str>,
    pub gift_image: Option<&'a str>,
}

/// Build the message telling `giver_name` whom they give to.
///
/// Blank gift ideas and images are omitted. A relative image path is
/// resolved against `public_base_url` so the link works outside the app.
pub fn compose_assignment_message(
    event_name: &str,
    giver_name: &str,
    receiver: &ReceiverDetails<'_>,
    public_base_url: &str,
) -> ComposedMessage {
    let subject = format!("Secret Santa \"{event_name}\": your mission!");

    let mut body = format!(
        "Hello {giver_name},\n\n\
         The draw for \"{event_name}\" has been made.\n\
         You are the Secret Santa of: {}\n",
        receiver.name
    );

    if let Some(idea) = non_blank(receiver.gift_idea) {
        body.push_str(&format!("\nTheir gift idea: {idea}\n"));
    }
    if let Some(image) = non_blank(receiver.gift_image) {
        body.push_str(&format!(
            "Picture of the idea: {}\n",
            resolve_image_url(image, public_base_url)
        ));
    }

    body.push_str("\nKeep it secret!\n");

    ComposedMessage { subject, body }
}

/// Turn a stored image reference into an absolute URL.
pub fn resolve_image_url(image: &str, public_base_url: &str) -> String {
    if image.starts_with("http://") || image.starts_with("https://") {
        return image.to_string();
    }
    format!(
        "{}/{}",
        public_base_url.trim_end_matches('/'),
        image.trim_start_matches('/')
    )
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
