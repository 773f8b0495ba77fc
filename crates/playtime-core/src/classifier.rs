/// Phrase the server logs when a player connects.
pub const JOIN_PHRASE: &str = "joined the game";
/// Phrase the server logs when a player disconnects.
pub const LEAVE_PHRASE: &str = "left the game";

/// Position of the player name counted from the last token
/// (`<name> joined the game`).
const NAME_TOKEN_FROM_END: usize = 4;

/// A player event found in a single log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEvent<'a> {
    Join(&'a str),
    Leave(&'a str),
}

impl<'a> LineEvent<'a> {
    pub fn player(&self) -> &'a str {
        match self {
            LineEvent::Join(name) | LineEvent::Leave(name) => name,
        }
    }
}

/// Classify a raw log line.
///
/// Leave and join are checked independently, so a line containing both
/// phrases yields both events, leave first. An empty result means the line
/// is not a player event. The name may be empty when the line is too short
/// to hold one.
pub fn classify(line: &str) -> Vec<LineEvent<'_>> {
    let mut events = Vec::new();

    if line.contains(LEAVE_PHRASE) {
        events.push(LineEvent::Leave(player_name(line)));
    }
    if line.contains(JOIN_PHRASE) {
        events.push(LineEvent::Join(player_name(line)));
    }

    events
}

/// The whitespace-separated token four from the end, or `""` if the line
/// has fewer than five tokens.
pub fn player_name(line: &str) -> &str {
    let mut tokens = line.split_whitespace().rev();
    match tokens.nth(NAME_TOKEN_FROM_END - 1) {
        Some(name) if tokens.next().is_some() => name,
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_name() {
        let cases = [
            ("[13:13:26] [Server thread/INFO]: Ralea2 joined the game", "Ralea2"),
            ("[13:15:52] [Server thread/INFO]: adidfr joined the game", "adidfr"),
            ("[09:54:41] [Server thread/INFO]: Ralea2 left the game", "Ralea2"),
            ("[13:22:28] [Server thread/INFO]: adidfr left the game", "adidfr"),
            ("", ""),
        ];

        for (line, name) in cases {
            assert_eq!(player_name(line), name, "line: {:?}", line);
        }
    }

    #[test]
    fn test_player_name_needs_five_tokens() {
        assert_eq!(player_name("Ralea2 joined the game"), "");
        assert_eq!(player_name("x Ralea2 joined the game"), "Ralea2");
    }

    #[test]
    fn test_classify_join() {
        let events = classify("[13:13:26] [Server thread/INFO]: Ralea2 joined the game");
        assert_eq!(events, vec![LineEvent::Join("Ralea2")]);
    }

    #[test]
    fn test_classify_leave() {
        let events = classify("[09:54:41] [Server thread/INFO]: Ralea2 left the game");
        assert_eq!(events, vec![LineEvent::Leave("Ralea2")]);
        assert_eq!(events[0].player(), "Ralea2");
    }

    #[test]
    fn test_classify_unrelated_and_empty() {
        assert!(classify("").is_empty());
        assert!(classify("[13:14:00] [Server thread/INFO]: Saving chunks for level 'world'").is_empty());
    }

    #[test]
    fn test_classify_short_line_keeps_empty_name() {
        assert_eq!(classify("left the game"), vec![LineEvent::Leave("")]);
    }

    #[test]
    fn test_classify_both_phrases() {
        let line = "[13:00:00] [Server thread/INFO]: <bob> I left the game because alice joined the game";
        let events = classify(line);
        assert_eq!(
            events,
            vec![LineEvent::Leave("alice"), LineEvent::Join("alice")]
        );
    }
}
