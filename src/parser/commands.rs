use crate::parser::data_lines;

/// Built-in console commands of common node software
///
/// Anything a node lists in its help output that is not here is treated as a
/// user-facing application (BBS, CHAT, WX, ...).
pub const STANDARD_COMMANDS: &[&str] = &[
    "?", "A", "APPLS", "ATTACH", "B", "BYE", "C", "CONNECT", "CQ", "D", "DISC", "DISCONNECT",
    "H", "HELP", "HOME", "I", "IDLETIME", "INFO", "L", "L4T1", "LINKS", "M", "MH", "MHEARD",
    "MHL", "MHU", "MHV", "N", "NODES", "NRR", "P", "PACLEN", "PING", "PORTS", "QUIT", "R",
    "ROUTES", "S", "SESSION", "STATS", "STREAMS", "T", "TALK", "TELNET", "TIME", "U",
    "UNPROTO", "USERS", "V", "VER", "VERSION", "X",
];

/// Commands and applications advertised by a node's help output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandList {
    /// Every command word listed, in order
    pub commands: Vec<String>,
    /// The non-standard remainder
    pub applications: Vec<String>,
}

/// Parses the output of the help (`?`) command
///
/// Command words are uppercase tokens separated by whitespace or commas.
/// Lowercase or mixed-case words are prose and are ignored.
///
/// # Examples
///
/// ```
/// use nodemap::parser::parse_commands;
///
/// let list = parse_commands("CONNECT BYE INFO NODES PORTS ROUTES USERS MHEARD BBS CHAT WX\n");
/// assert_eq!(list.applications, vec!["BBS", "CHAT", "WX"]);
/// ```
pub fn parse_commands(text: &str) -> CommandList {
    let mut list = CommandList::default();

    for line in data_lines(text) {
        for token in line.split(|c: char| c.is_whitespace() || c == ',') {
            let word = token.trim_matches(|c: char| matches!(c, '.' | ':' | ';' | '(' | ')'));
            if !is_command_word(word) || list.commands.iter().any(|c| c == word) {
                continue;
            }

            list.commands.push(word.to_string());
            if !STANDARD_COMMANDS.contains(&word) {
                list.applications.push(word.to_string());
            }
        }
    }

    list
}

fn is_command_word(word: &str) -> bool {
    if word == "?" {
        return true;
    }
    !word.is_empty()
        && word.len() <= 12
        && word.chars().any(|c| c.is_ascii_uppercase())
        && word
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}
