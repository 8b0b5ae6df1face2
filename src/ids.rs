//! Strongly-typed snowflake identifiers for the platform boundary.
//!
//! These are thin wrappers over the platform's `u64` snowflakes so that a
//! message ID can never be passed where a user ID is expected.

use serde::{Deserialize, Serialize};

macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                value.parse().map(Self)
            }
        }
    };
}

snowflake_id!(
    /// ID of an application registered with the platform.
    ApplicationId
);
snowflake_id!(
    /// ID of a channel.
    ChannelId
);
snowflake_id!(
    /// ID of a guild.
    GuildId
);
snowflake_id!(
    /// ID of an inbound interaction event.
    InteractionId
);
snowflake_id!(
    /// ID of a message.
    MessageId
);
snowflake_id!(
    /// ID of a user.
    UserId
);
snowflake_id!(
    /// ID of a webhook.
    WebhookId
);
