//! Line parser for IRCCloud channel exports.
//!
//! Exports interleave authored messages with event lines:
//!
//! ```text
//! #warsow.na
//! [2016-10-03 21:38:29] → Joined channel #warsow.na
//! [2016-10-03 21:38:33] * Channel mode is +tnCNuT
//! [2016-10-03 21:38:45] <dmh> asdfadsf
//! ```
//!
//! Only the `<nick>` lines are messages. Everything else is dropped without
//! logging, since event lines make up a large share of every export.

use crate::domain::ParsedMessage;

/// Parses one export line into a message, or `None` when the line is not an
/// authored chat message.
///
/// The timestamp is returned verbatim; converting it is left to the sink.
pub fn parse_line(network: &str, channel: &str, line: &str) -> Option<ParsedMessage> {
    // Channel header on the first line; the channel already came from the filename
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let ts_end = line.find(']')?;
    let timestamp = line.get(1..ts_end)?;
    let rest = line.get(ts_end + 1..)?.strip_prefix(' ')?;

    let tokens: Vec<&str> = rest.split(' ').collect();
    if tokens.len() < 2 {
        return None;
    }

    let sender = tokens[0];
    if !(sender.starts_with('<') && sender.ends_with('>')) {
        return None;
    }
    let nick = sender.trim_matches(|c| c == '<' || c == '>');

    Some(ParsedMessage {
        network: network.to_string(),
        channel: channel.to_string(),
        timestamp: timestamp.to_string(),
        nick: nick.to_string(),
        body: tokens[1..].join(" "),
    })
}
