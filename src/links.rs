//! Parse and build links to platform resources.
//!
//! Covers the three link shapes bots commonly round-trip: message links,
//! invite links and webhook links. Parsing accepts the canary/ptb and
//! legacy domains; building always emits the canonical domain.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::ValidationError;
use crate::ids::{ChannelId, GuildId, MessageId, WebhookId};

/// Canonical base URL used when building links.
pub const BASE_URL: &str = "https://discord.com";

const DOMAIN_PATTERN: &str = r"(?:https?://)?(?:www\.)?(?:canary\.|ptb\.)?discord(?:app)?\.com";

fn message_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(&format!(r"{DOMAIN_PATTERN}/channels/(@me|\d+)/(\d+)/(\d+)"))
            .expect("message link pattern is valid")
    })
}

fn invite_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?:https?://)?(?:www\.)?(?:discord\.gg|(?:canary\.|ptb\.)?discord(?:app)?\.com/invite)/([\w-]+)",
        )
        .expect("invite link pattern is valid")
    })
}

fn webhook_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(&format!(r"{DOMAIN_PATTERN}/api/webhooks/(\d+)/([\w\.-]+)"))
            .expect("webhook link pattern is valid")
    })
}

fn is_full_match(pattern: &Regex, value: &str) -> Option<(usize, usize)> {
    let found = pattern.find(value)?;
    (found.start() == 0 && found.end() == value.len()).then(|| (found.start(), found.end()))
}

/// A link to a message, e.g. `https://discord.com/channels/123/456/789`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageLink {
    /// [`None`] for DM message links (`@me`).
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
    pub message_id: MessageId,
}

impl MessageLink {
    /// Find the first message link in a block of content.
    pub fn find(content: &str) -> Option<Self> {
        Self::find_iter(content).next()
    }

    /// Iterate over every message link in a block of content.
    pub fn find_iter(content: &str) -> impl Iterator<Item = Self> + '_ {
        message_pattern()
            .captures_iter(content)
            .filter_map(|captures| Self::from_captures(&captures))
    }

    pub fn is_dm_link(&self) -> bool {
        self.guild_id.is_none()
    }

    fn from_captures(captures: &regex::Captures<'_>) -> Option<Self> {
        let guild_id = match &captures[1] {
            "@me" => None,
            raw => Some(GuildId(raw.parse().ok()?)),
        };
        Some(Self {
            guild_id,
            channel_id: ChannelId(captures[2].parse().ok()?),
            message_id: MessageId(captures[3].parse().ok()?),
        })
    }
}

impl FromStr for MessageLink {
    type Err = ValidationError;

    fn from_str(link: &str) -> Result<Self, Self::Err> {
        let link = link.trim();
        is_full_match(message_pattern(), link)
            .and_then(|_| {
                message_pattern()
                    .captures(link)
                    .and_then(|captures| Self::from_captures(&captures))
            })
            .ok_or(ValidationError::MalformedLink { kind: "message" })
    }
}

impl fmt::Display for MessageLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.guild_id {
            Some(guild_id) => write!(
                f,
                "{BASE_URL}/channels/{guild_id}/{}/{}",
                self.channel_id, self.message_id
            ),
            None => write!(
                f,
                "{BASE_URL}/channels/@me/{}/{}",
                self.channel_id, self.message_id
            ),
        }
    }
}

/// An invite link, e.g. `https://discord.gg/somecode`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InviteLink {
    pub code: String,
}

impl InviteLink {
    pub fn find(content: &str) -> Option<Self> {
        Self::find_iter(content).next()
    }

    pub fn find_iter(content: &str) -> impl Iterator<Item = Self> + '_ {
        invite_pattern().captures_iter(content).map(|captures| Self {
            code: captures[1].to_owned(),
        })
    }
}

impl FromStr for InviteLink {
    type Err = ValidationError;

    fn from_str(link: &str) -> Result<Self, Self::Err> {
        let link = link.trim();
        is_full_match(invite_pattern(), link)
            .and_then(|_| invite_pattern().captures(link))
            .map(|captures| Self {
                code: captures[1].to_owned(),
            })
            .ok_or(ValidationError::MalformedLink { kind: "invite" })
    }
}

impl fmt::Display for InviteLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "https://discord.gg/{}", self.code)
    }
}

/// An incoming-webhook link carrying the webhook's ID and token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WebhookLink {
    pub webhook_id: WebhookId,
    pub token: String,
}

impl WebhookLink {
    pub fn find(content: &str) -> Option<Self> {
        Self::find_iter(content).next()
    }

    pub fn find_iter(content: &str) -> impl Iterator<Item = Self> + '_ {
        webhook_pattern()
            .captures_iter(content)
            .filter_map(|captures| {
                Some(Self {
                    webhook_id: WebhookId(captures[1].parse().ok()?),
                    token: captures[2].to_owned(),
                })
            })
    }
}

impl FromStr for WebhookLink {
    type Err = ValidationError;

    fn from_str(link: &str) -> Result<Self, Self::Err> {
        let link = link.trim();
        is_full_match(webhook_pattern(), link)
            .and_then(|_| {
                webhook_pattern().captures(link).and_then(|captures| {
                    Some(Self {
                        webhook_id: WebhookId(captures[1].parse().ok()?),
                        token: captures[2].to_owned(),
                    })
                })
            })
            .ok_or(ValidationError::MalformedLink { kind: "webhook" })
    }
}

impl fmt::Display for WebhookLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{BASE_URL}/api/webhooks/{}/{}",
            self.webhook_id, self.token
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_link_round_trip() {
        let link: MessageLink = "https://discord.com/channels/111/222/333".parse().unwrap();
        assert_eq!(link.guild_id, Some(GuildId(111)));
        assert_eq!(link.channel_id, ChannelId(222));
        assert_eq!(link.message_id, MessageId(333));
        assert_eq!(link.to_string(), "https://discord.com/channels/111/222/333");
    }

    #[test]
    fn test_dm_message_link() {
        let link: MessageLink = "https://discord.com/channels/@me/222/333".parse().unwrap();
        assert!(link.is_dm_link());
        assert_eq!(link.to_string(), "https://discord.com/channels/@me/222/333");
    }

    #[test]
    fn test_message_link_alternative_domains() {
        for raw in [
            "https://canary.discord.com/channels/1/2/3",
            "https://ptb.discord.com/channels/1/2/3",
            "discordapp.com/channels/1/2/3",
        ] {
            assert!(raw.parse::<MessageLink>().is_ok(), "failed to parse {raw}");
        }
    }

    #[test]
    fn test_malformed_message_link_rejected() {
        for raw in [
            "https://discord.com/channels/1/2",
            "https://example.com/channels/1/2/3",
            "look at https://discord.com/channels/1/2/3",
        ] {
            assert!(matches!(
                raw.parse::<MessageLink>(),
                Err(ValidationError::MalformedLink { kind: "message" })
            ));
        }
    }

    #[test]
    fn test_find_iter_scans_content() {
        let content =
            "see https://discord.com/channels/1/2/3 and https://discord.com/channels/4/5/6 too";
        let links: Vec<MessageLink> = MessageLink::find_iter(content).collect();
        assert_eq!(links.len(), 2);
        assert_eq!(links[1].guild_id, Some(GuildId(4)));
    }

    #[test]
    fn test_invite_links() {
        let link: InviteLink = "https://discord.gg/abc-123".parse().unwrap();
        assert_eq!(link.code, "abc-123");
        assert_eq!(link.to_string(), "https://discord.gg/abc-123");

        let found = InviteLink::find("join discord.com/invite/xyz now").unwrap();
        assert_eq!(found.code, "xyz");
    }

    #[test]
    fn test_webhook_links() {
        let raw = "https://discord.com/api/webhooks/123/token-abc.def";
        let link: WebhookLink = raw.parse().unwrap();
        assert_eq!(link.webhook_id, WebhookId(123));
        assert_eq!(link.token, "token-abc.def");
        assert_eq!(link.to_string(), raw);
    }
}
