//! Minimal Discord API v10 models: the gateway envelope, the dispatches the
//! bot consumes, and JSON builders for outgoing messages.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::bot::commands::MENU_SELECT_ID;
use crate::bot::reply::{Embed, Reply};

/// Intents: GUILDS | GUILD_MESSAGES | MESSAGE_CONTENT.
pub const INTENTS: u32 = (1 << 0) | (1 << 9) | (1 << 15);

/// Interaction type for buttons and select menus.
pub const INTERACTION_MESSAGE_COMPONENT: u8 = 3;
/// Interaction callback: reply with a channel message.
pub const CALLBACK_CHANNEL_MESSAGE: u8 = 4;
/// Message flag: only the invoking user sees it.
pub const FLAG_EPHEMERAL: u64 = 1 << 6;

const CHANNEL_GUILD_TEXT: u8 = 0;

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayPayload {
    pub op: u8,
    #[serde(default)]
    pub d: Option<Value>,
    #[serde(default)]
    pub s: Option<u64>,
    #[serde(default)]
    pub t: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub nick: Option<String>,
}

/// Nickname, then global display name, then username.
pub fn display_name(user: &User, member: Option<&Member>) -> String {
    member
        .and_then(|m| m.nick.clone())
        .or_else(|| user.global_name.clone())
        .unwrap_or_else(|| user.username.clone())
}

#[derive(Debug, Clone, Deserialize)]
pub struct PartialGuild {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PartialApplication {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ready {
    pub session_id: String,
    pub resume_gateway_url: String,
    pub user: User,
    #[serde(default)]
    pub guilds: Vec<PartialGuild>,
    pub application: PartialApplication,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub position: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Guild {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub system_channel_id: Option<String>,
    #[serde(default)]
    pub channels: Vec<Channel>,
}

impl Guild {
    /// The system channel, else the top-most text channel.
    pub fn welcome_channel(&self) -> Option<String> {
        if let Some(id) = &self.system_channel_id {
            return Some(id.clone());
        }
        self.channels
            .iter()
            .filter(|c| c.kind == CHANNEL_GUILD_TEXT)
            .min_by_key(|c| c.position.unwrap_or(i64::MAX))
            .map(|c| c.id.clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub id: String,
    pub channel_id: String,
    pub author: User,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub member: Option<Member>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct InteractionData {
    #[serde(default)]
    pub custom_id: Option<String>,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Interaction {
    pub id: String,
    pub application_id: String,
    pub token: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub member: Option<Member>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub data: Option<InteractionData>,
}

impl Interaction {
    /// Guild interactions carry the user inside `member`, DMs carry it directly.
    pub fn invoker(&self) -> Option<&User> {
        self.member
            .as_ref()
            .and_then(|m| m.user.as_ref())
            .or(self.user.as_ref())
    }
}

/// A parsed gateway frame.
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    Ready(Ready),
    GuildCreate(Guild),
    MessageCreate(Message),
    InteractionCreate(Interaction),
    HeartbeatAck,
    HeartbeatRequest,
    Reconnect,
    /// Op 9; `true` when the session can be resumed.
    InvalidSession(bool),
    /// Anything the bot does not act on.
    Other { op: u8, name: Option<String> },
}

impl GatewayEvent {
    pub fn from_payload(payload: GatewayPayload) -> Self {
        match payload.op {
            0 => Self::dispatch(payload.t, payload.d),
            1 => GatewayEvent::HeartbeatRequest,
            7 => GatewayEvent::Reconnect,
            9 => GatewayEvent::InvalidSession(
                payload.d.as_ref().and_then(Value::as_bool).unwrap_or(false),
            ),
            11 => GatewayEvent::HeartbeatAck,
            op => GatewayEvent::Other { op, name: payload.t },
        }
    }

    fn dispatch(name: Option<String>, data: Option<Value>) -> Self {
        let (Some(name), Some(data)) = (name.clone(), data) else {
            return GatewayEvent::Other { op: 0, name };
        };
        let parsed = match name.as_str() {
            "READY" => serde_json::from_value(data).map(GatewayEvent::Ready),
            "GUILD_CREATE" => serde_json::from_value(data).map(GatewayEvent::GuildCreate),
            "MESSAGE_CREATE" => serde_json::from_value(data).map(GatewayEvent::MessageCreate),
            "INTERACTION_CREATE" => {
                serde_json::from_value(data).map(GatewayEvent::InteractionCreate)
            }
            _ => return GatewayEvent::Other { op: 0, name: Some(name) },
        };
        parsed.unwrap_or_else(|e| {
            log::warn!("Failed to parse {} payload: {}", name, e);
            GatewayEvent::Other { op: 0, name: Some(name) }
        })
    }
}

// ---------------------------------------------------------------------------
// Outgoing JSON
// ---------------------------------------------------------------------------

fn embed_json(embed: &Embed) -> Value {
    let mut out = json!({
        "title": embed.title,
        "color": embed.color,
    });
    if let Some(desc) = &embed.description {
        out["description"] = json!(desc);
    }
    if !embed.fields.is_empty() {
        out["fields"] = Value::Array(
            embed
                .fields
                .iter()
                .map(|f| json!({"name": f.name, "value": f.value, "inline": f.inline}))
                .collect(),
        );
    }
    if let Some(footer) = &embed.footer {
        out["footer"] = json!({ "text": footer });
    }
    out
}

/// Button row plus the "More actions..." select.
pub fn menu_components() -> Value {
    let button = |id: &str, label: &str, emoji: &str, style: u8| {
        json!({
            "type": 2,
            "style": style,
            "custom_id": id,
            "label": label,
            "emoji": { "name": emoji },
        })
    };
    let option = |value: &str, label: &str, emoji: &str| {
        json!({ "label": label, "value": value, "emoji": { "name": emoji } })
    };
    json!([
        {
            "type": 1,
            "components": [
                button("sq:catch", "Catch!", "🪤", 3),
                button("sq:bag", "Bag", "🎒", 1),
                button("sq:balance", "Balance", "💰", 1),
                button("sq:profile", "Profile", "🐿️", 1),
            ]
        },
        {
            "type": 1,
            "components": [{
                "type": 3,
                "custom_id": MENU_SELECT_ID,
                "placeholder": "More actions...",
                "options": [
                    option("daily", "Daily Bonus", "🎁"),
                    option("bestiary", "Bestiary", "📖"),
                    option("leaderboard", "Leaderboard", "🏆"),
                    option("shop", "Shop", "🛒"),
                    option("buffs", "Active Boosts", "✨"),
                    option("exchange", "Exchange Rates", "🔄"),
                    option("help", "Help", "❓"),
                ]
            }]
        }
    ])
}

/// Body for create/edit message. `content` is always present so an edit
/// clears the suspense line.
pub fn message_body(reply: &Reply) -> Value {
    let mut body = json!({
        "content": reply.content.clone().unwrap_or_default(),
        "embeds": reply.embed.iter().map(embed_json).collect::<Vec<_>>(),
    });
    if reply.with_menu {
        body["components"] = menu_components();
    }
    body
}

pub fn suspense_body(line: &str) -> Value {
    json!({ "content": line })
}

pub fn interaction_response(data: Value, ephemeral: bool) -> Value {
    let mut data = data;
    if ephemeral {
        data["flags"] = json!(FLAG_EPHEMERAL);
    }
    json!({ "type": CALLBACK_CHANNEL_MESSAGE, "data": data })
}

pub fn presence_update(prefix: &str) -> Value {
    json!({
        "op": 3,
        "d": {
            "since": null,
            "activities": [{ "name": format!("{}help | 🐿️", prefix), "type": 0 }],
            "status": "online",
            "afk": false,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_message_create() {
        let payload: GatewayPayload = serde_json::from_str(
            r#"{"op":0,"s":4,"t":"MESSAGE_CREATE","d":{"id":"1","channel_id":"2",
                "content":"!sq catch","author":{"id":"3","username":"hazel","global_name":"Hazel"}}}"#,
        )
        .unwrap();
        match GatewayEvent::from_payload(payload) {
            GatewayEvent::MessageCreate(msg) => {
                assert_eq!(msg.content, "!sq catch");
                assert_eq!(display_name(&msg.author, msg.member.as_ref()), "Hazel");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn invalid_session_flag() {
        let payload: GatewayPayload = serde_json::from_str(r#"{"op":9,"d":true}"#).unwrap();
        assert!(matches!(
            GatewayEvent::from_payload(payload),
            GatewayEvent::InvalidSession(true)
        ));
    }

    #[test]
    fn welcome_channel_prefers_system_channel() {
        let guild: Guild = serde_json::from_str(
            r#"{"id":"g","system_channel_id":null,"channels":[
                {"id":"voice","type":2,"position":0},
                {"id":"b","type":0,"position":3},
                {"id":"a","type":0,"position":1}]}"#,
        )
        .unwrap();
        assert_eq!(guild.welcome_channel().as_deref(), Some("a"));
    }

    #[test]
    fn ephemeral_flag_is_set() {
        let body = interaction_response(message_body(&Reply::text("hi")), true);
        assert_eq!(body["type"], 4);
        assert_eq!(body["data"]["flags"], 64);
        assert_eq!(body["data"]["content"], "hi");
    }
}
