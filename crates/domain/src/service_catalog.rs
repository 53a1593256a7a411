/// Definition of a blockable service from the built-in catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub rules: &'static [&'static str],
}

/// The known blockable services. Operator configuration referencing a
/// service outside this registry is dropped at construction.
pub fn known_services() -> &'static [ServiceDefinition] {
    SERVICES
}

pub fn is_known(id: &str) -> bool {
    SERVICES.iter().any(|s| s.id == id)
}

pub fn find_service(id: &str) -> Option<&'static ServiceDefinition> {
    SERVICES.iter().find(|s| s.id == id)
}

static SERVICES: &[ServiceDefinition] = &[
    ServiceDefinition {
        id: "facebook",
        name: "Facebook",
        rules: &[
            "||facebook.com^",
            "||fbcdn.net^",
            "||fb.com^",
            "||fb.gg^",
            "||fbsbx.com^",
            "||messenger.com^",
        ],
    },
    ServiceDefinition {
        id: "instagram",
        name: "Instagram",
        rules: &["||instagram.com^", "||cdninstagram.com^", "||ig.me^"],
    },
    ServiceDefinition {
        id: "whatsapp",
        name: "WhatsApp",
        rules: &["||whatsapp.com^", "||whatsapp.net^", "||wa.me^"],
    },
    ServiceDefinition {
        id: "youtube",
        name: "YouTube",
        rules: &[
            "||youtube.com^",
            "||youtu.be^",
            "||ytimg.com^",
            "||googlevideo.com^",
            "||youtube-nocookie.com^",
        ],
    },
    ServiceDefinition {
        id: "tiktok",
        name: "TikTok",
        rules: &[
            "||tiktok.com^",
            "||tiktokcdn.com^",
            "||tiktokv.com^",
            "||musical.ly^",
        ],
    },
    ServiceDefinition {
        id: "twitter",
        name: "Twitter",
        rules: &["||twitter.com^", "||twimg.com^", "||t.co^", "||x.com^"],
    },
    ServiceDefinition {
        id: "snapchat",
        name: "Snapchat",
        rules: &["||snapchat.com^", "||sc-cdn.net^", "||snap.com^"],
    },
    ServiceDefinition {
        id: "discord",
        name: "Discord",
        rules: &["||discord.com^", "||discordapp.com^", "||discord.gg^"],
    },
    ServiceDefinition {
        id: "twitch",
        name: "Twitch",
        rules: &["||twitch.tv^", "||ttvnw.net^", "||jtvnw.net^"],
    },
    ServiceDefinition {
        id: "netflix",
        name: "Netflix",
        rules: &["||netflix.com^", "||nflxvideo.net^", "||nflximg.net^"],
    },
    ServiceDefinition {
        id: "reddit",
        name: "Reddit",
        rules: &["||reddit.com^", "||redditmedia.com^", "||redd.it^"],
    },
    ServiceDefinition {
        id: "steam",
        name: "Steam",
        rules: &["||steampowered.com^", "||steamcommunity.com^", "||steamstatic.com^"],
    },
];
