//! Transport-neutral reply model.
//!
//! Handlers build a [`Reply`]; the Discord adapter turns it into a message or
//! interaction payload and the console mode prints it as plain text.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Embed {
    pub title: String,
    pub description: Option<String>,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub footer: Option<String>,
}

impl Embed {
    pub fn new(title: impl Into<String>, color: u32) -> Self {
        Self {
            title: title.into(),
            color,
            ..Default::default()
        }
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(text.into());
        self
    }

    /// Plain-text rendering used by the console mode.
    pub fn to_plain_text(&self) -> String {
        let mut out = vec![format!("== {} ==", self.title)];
        if let Some(desc) = &self.description {
            out.push(desc.clone());
        }
        for field in &self.fields {
            out.push(format!("{}: {}", field.name, field.value));
        }
        if let Some(footer) = &self.footer {
            out.push(format!("({})", footer));
        }
        out.join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reply {
    pub content: Option<String>,
    pub embed: Option<Embed>,
    /// Posted first and edited into the real reply after the suspense delay.
    pub suspense: Option<String>,
    /// Only visible to the invoking user (interactions only).
    pub ephemeral: bool,
    /// Attach the button row and select menu.
    pub with_menu: bool,
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// An embed with the menu attached, the shape of most views.
    pub fn embed(embed: Embed) -> Self {
        Self {
            embed: Some(embed),
            with_menu: true,
            ..Default::default()
        }
    }

    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }

    pub fn with_suspense(mut self, line: impl Into<String>) -> Self {
        self.suspense = Some(line.into());
        self
    }

    pub fn to_plain_text(&self) -> String {
        let mut parts = Vec::new();
        if let Some(content) = &self.content {
            parts.push(content.clone());
        }
        if let Some(embed) = &self.embed {
            parts.push(embed.to_plain_text());
        }
        parts.join("\n")
    }
}
