//! Help command - lists the console commands.

use crate::commands::CommandHandler;
use crate::error::AppResult;
use crate::input::CommandLine;
use async_trait::async_trait;

pub struct HelpHandler;

impl HelpHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HelpHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandHandler for HelpHandler {
    fn name(&self) -> &str {
        "help"
    }

    fn matches(&self, line: &CommandLine) -> bool {
        line.command == "help" || line.command == "?"
    }

    async fn execute(&self, _line: &CommandLine) -> AppResult<String> {
        Ok(r#"WhatsApp bridge console. Arguments are key=value; quote values with spaces.

Recipients: to=<number or JID> [kind=user|group|newsletter|status]
Send options: forwarded=yes reply=<message id> duration=<secs, 0 or 86400..7776000>
Attachments: file=<local path> or url=<http(s) URL>

app login | qr | stop | login-code to=<phone> | logout | reconnect
device list | use id=<id> | create [id=<id>] | delete id=<id>
send message   to=.. message=".."
send image     to=.. file=..|url=.. [caption=..] [view_once] [compress]
send video     to=.. file=..|url=.. [caption=..] [view_once] [compress]
send audio     to=.. file=..|url=.. [ptt]
send file      to=.. file=..|url=.. [caption=..]
send sticker   to=.. file=..|url=..
send contact   to=.. name=.. phone=..
send link      to=.. link=.. caption=..
send poll      to=.. question=.. option=.. option=.. [max_answer=1]
send presence  presence=available|unavailable
send typing    to=.. state=start|stop
chat list [search=..] [has_media=yes] [filter=..] | next | prev
chat select jid=.. | messages [jid=..] [search=..] [from_me=yes|no|any]
     [media_only=yes] [start=<RFC 3339>] [end=<RFC 3339>] | more
chat downloads | retry id=<message id>
chat disappearing to=.. timer=<secs> | pin to=.. [pinned=no]
chat react to=.. id=.. emoji=.. | read to=.. id=..
group list | name to=.. name=.. | announce to=.. [enabled=no]
group locked to=.. [enabled=no] | leave to=.. | invite-link to=.. [reset]
group info to=.. | requests to=.. | approve|reject to=.. participants=a,b
group info-from-link link=.. | export to=..
account contacts | export | privacy | newsletters
account avatar to=.. [preview] [community] | business to=.. | check to=..
account unfollow to=<newsletter>
help"#
            .into())
    }
}
