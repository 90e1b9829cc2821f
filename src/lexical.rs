//! Automaton-driven lexical analysis.
//!
//! The scan splits a raw token into `HEADER`, `PAYLOAD` and `SIGNATURE` lexemes and
//! flags every character outside the base64url alphabet with an `ERROR` lexeme. Unlike
//! [`ParsedToken`](crate::ParsedToken) parsing, the scan never fails.
//!
//! The deterministic finite automaton recognizing the `HEADER.PAYLOAD.SIGNATURE` shape
//! is described by [`JWT_AUTOMATON`]; it is reported alongside the scan results
//! and is run over the token to determine whether the token's shape is accepted.

use serde::{ser::SerializeMap, Serialize, Serializer};

use core::fmt;

use crate::base64url;

/// Message attached to `ERROR` lexemes.
const ERROR_MESSAGE: &str = "character outside the Base64URL alphabet";

/// State of the token automaton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum State {
    /// Start state.
    #[serde(rename = "q0")]
    Start,
    /// Reading the header segment.
    #[serde(rename = "qHeader")]
    Header,
    /// Reading the payload segment.
    #[serde(rename = "qPayload")]
    Payload,
    /// Reading the signature segment. The only accepting state.
    #[serde(rename = "qSignature")]
    Signature,
    /// Sink state.
    #[serde(rename = "qError")]
    Error,
}

impl State {
    /// Returns the conventional name of the state, e.g. `qHeader`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Start => "q0",
            Self::Header => "qHeader",
            Self::Payload => "qPayload",
            Self::Signature => "qSignature",
            Self::Error => "qError",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for State {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

/// Character class of the automaton alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharClass {
    /// Any of `[A-Za-z0-9-_]`.
    Base64Url,
    /// Segment separator `.`.
    Dot,
}

impl CharClass {
    /// Classifies a character. Returns `None` for characters outside the alphabet.
    pub fn of(ch: char) -> Option<Self> {
        if ch == '.' {
            Some(Self::Dot)
        } else if base64url::is_alphabet_char(ch) {
            Some(Self::Base64Url)
        } else {
            None
        }
    }

    /// Returns the label of the class used in reports.
    pub fn label(self) -> &'static str {
        match self {
            Self::Base64Url => "base64url",
            Self::Dot => ".",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Transition table indexed by `[state][char class]`.
pub type TransitionTable = [[State; 2]; 5];

const TRANSITIONS: TransitionTable = [
    // q0
    [State::Header, State::Error],
    // qHeader
    [State::Header, State::Payload],
    // qPayload
    [State::Payload, State::Signature],
    // qSignature
    [State::Signature, State::Error],
    // qError
    [State::Error, State::Error],
];

/// Static description of a deterministic finite automaton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomatonSpec {
    /// Human-readable description.
    pub description: &'static str,
    /// Characters accepted by the automaton.
    pub alphabet: &'static str,
    /// All states.
    pub states: [State; 5],
    /// Start state.
    pub start_state: State,
    /// Accepting states.
    pub accept_states: [State; 1],
    /// Transitions.
    #[serde(serialize_with = "serialize_transitions")]
    pub transitions: &'static TransitionTable,
}

/// Automaton recognizing the `HEADER.PAYLOAD.SIGNATURE` token shape.
pub const JWT_AUTOMATON: AutomatonSpec = AutomatonSpec {
    description: "DFA recognizing the base structure of a JWT: HEADER.PAYLOAD.SIGNATURE",
    alphabet: "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_.",
    states: [
        State::Start,
        State::Header,
        State::Payload,
        State::Signature,
        State::Error,
    ],
    start_state: State::Start,
    accept_states: [State::Signature],
    transitions: &TRANSITIONS,
};

impl AutomatonSpec {
    /// Returns the state reached from `state` on a character of the specified `class`.
    pub fn transition(&self, state: State, class: CharClass) -> State {
        self.transitions[state.index()][class.index()]
    }

    /// Checks whether `state` is accepting.
    pub fn is_accepting(&self, state: State) -> bool {
        self.accept_states.contains(&state)
    }

    /// Runs the automaton over `input` and returns the final state. Characters outside
    /// the alphabet lead to the error state.
    pub fn run(&self, input: &str) -> State {
        input.chars().fold(self.start_state, |state, ch| match CharClass::of(ch) {
            Some(class) => self.transition(state, class),
            None => State::Error,
        })
    }
}

fn serialize_transitions<S: Serializer>(
    table: &&'static TransitionTable,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    struct Row([State; 2]);

    impl Serialize for Row {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut map = serializer.serialize_map(Some(2))?;
            for class in [CharClass::Base64Url, CharClass::Dot] {
                map.serialize_entry(class.label(), &self.0[class.index()])?;
            }
            map.end()
        }
    }

    let mut map = serializer.serialize_map(Some(table.len()))?;
    for state in JWT_AUTOMATON.states {
        map.serialize_entry(state.name(), &Row(table[state.index()]))?;
    }
    map.end()
}

/// Kind of a [`Lexeme`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LexemeKind {
    /// Header segment.
    Header,
    /// Payload segment.
    Payload,
    /// Signature segment.
    Signature,
    /// Character outside the base64url alphabet.
    Error,
}

impl LexemeKind {
    fn for_segment(index: usize) -> Self {
        match index {
            0 => Self::Header,
            1 => Self::Payload,
            _ => Self::Signature,
        }
    }
}

/// Labeled span of a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lexeme {
    /// Lexeme kind.
    pub kind: LexemeKind,
    /// Raw lexeme text.
    pub value: String,
    /// Byte offset of the lexeme in the token.
    pub offset: usize,
    /// Whether the lexeme is a valid base64url segment. Always `false` for errors.
    pub valid: bool,
    /// Error description for `ERROR` lexemes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl Lexeme {
    fn segment(kind: LexemeKind, value: String, offset: usize) -> Self {
        Self {
            kind,
            valid: base64url::is_valid_segment(&value),
            value,
            offset,
            message: None,
        }
    }

    fn error(ch: char, offset: usize) -> Self {
        Self {
            kind: LexemeKind::Error,
            value: ch.to_string(),
            offset,
            valid: false,
            message: Some(ERROR_MESSAGE),
        }
    }
}

/// Summary counts of a lexical scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LexicalSummary {
    /// Number of `.` characters in the token.
    pub dot_count: usize,
    /// Number of segment (non-error) lexemes.
    pub part_count: usize,
}

/// Result of lexical analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LexicalReport {
    /// Lexemes in left-to-right order.
    pub lexemes: Vec<Lexeme>,
    /// Automaton describing the token shape.
    pub automaton: AutomatonSpec,
    /// Summary counts.
    pub summary: LexicalSummary,
    /// State of [`Self::automaton`] after consuming the whole token.
    pub final_state: State,
    /// Whether the final state is accepting.
    pub accepted: bool,
}

/// Scans `token` into lexemes.
///
/// # Examples
///
/// ```
/// # use jwt_anatomy::lexical::{self, LexemeKind};
/// let report = lexical::analyze("ab.c$d.ef");
/// let kinds: Vec<_> = report.lexemes.iter().map(|lexeme| lexeme.kind).collect();
/// assert_eq!(
///     kinds,
///     [LexemeKind::Header, LexemeKind::Error, LexemeKind::Payload, LexemeKind::Signature]
/// );
/// assert_eq!(report.lexemes[1].value, "$");
/// assert!(!report.accepted);
/// ```
pub fn analyze(token: &str) -> LexicalReport {
    let mut lexemes = vec![];
    let mut buffer = String::new();
    let mut segment_index = 0;
    let mut segment_start = 0;
    let mut dot_count = 0;

    for (offset, ch) in token.char_indices() {
        if ch == '.' {
            let value = core::mem::take(&mut buffer);
            let kind = LexemeKind::for_segment(segment_index);
            lexemes.push(Lexeme::segment(kind, value, segment_start));
            segment_index += 1;
            segment_start = offset + 1;
            dot_count += 1;
        } else {
            if !base64url::is_alphabet_char(ch) {
                tracing::trace!(offset, "character outside the base64url alphabet");
                lexemes.push(Lexeme::error(ch, offset));
            }
            buffer.push(ch);
        }
    }
    if !buffer.is_empty() {
        lexemes.push(Lexeme::segment(LexemeKind::Signature, buffer, segment_start));
    }

    let part_count = lexemes
        .iter()
        .filter(|lexeme| lexeme.kind != LexemeKind::Error)
        .count();
    let final_state = JWT_AUTOMATON.run(token);

    LexicalReport {
        lexemes,
        automaton: JWT_AUTOMATON,
        summary: LexicalSummary {
            dot_count,
            part_count,
        },
        final_state,
        accepted: JWT_AUTOMATON.is_accepting(final_state),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn well_formed_token() {
        let report = analyze("eyJh.eyJz.c2ln");
        assert_eq!(report.lexemes.len(), 3);
        let expected = [
            (LexemeKind::Header, "eyJh", 0),
            (LexemeKind::Payload, "eyJz", 5),
            (LexemeKind::Signature, "c2ln", 10),
        ];
        for (lexeme, (kind, value, offset)) in report.lexemes.iter().zip(expected) {
            assert_eq!(lexeme.kind, kind);
            assert_eq!(lexeme.value, value);
            assert_eq!(lexeme.offset, offset);
            assert!(lexeme.valid);
        }
        assert_eq!(
            report.summary,
            LexicalSummary {
                dot_count: 2,
                part_count: 3
            }
        );
        assert_eq!(report.final_state, State::Signature);
        assert!(report.accepted);
    }

    #[test]
    fn error_lexemes_do_not_replace_segments() {
        let report = analyze("a+b.c/d.e=");
        let kinds: Vec<_> = report.lexemes.iter().map(|lexeme| lexeme.kind).collect();
        assert_eq!(
            kinds,
            [
                LexemeKind::Error,
                LexemeKind::Header,
                LexemeKind::Error,
                LexemeKind::Payload,
                LexemeKind::Error,
                LexemeKind::Signature,
            ]
        );
        assert_eq!(report.lexemes[1].value, "a+b");
        assert!(!report.lexemes[1].valid);
        assert_eq!(report.lexemes[4].offset, 9);
        assert_eq!(report.lexemes[4].message, Some(ERROR_MESSAGE));
        assert_eq!(report.summary.part_count, 3);
        assert_eq!(report.final_state, State::Error);
        assert!(!report.accepted);
    }

    #[test]
    fn malformed_shapes_do_not_panic() {
        let report = analyze("");
        assert!(report.lexemes.is_empty());
        assert_eq!(report.final_state, State::Start);

        let report = analyze("abc");
        assert_eq!(report.lexemes.len(), 1);
        assert_eq!(report.lexemes[0].kind, LexemeKind::Signature);
        assert_eq!(report.final_state, State::Header);

        let report = analyze("a.b.c.d");
        let kinds: Vec<_> = report.lexemes.iter().map(|lexeme| lexeme.kind).collect();
        assert_eq!(
            kinds,
            [
                LexemeKind::Header,
                LexemeKind::Payload,
                LexemeKind::Signature,
                LexemeKind::Signature,
            ]
        );
        assert_eq!(report.summary.dot_count, 3);
        assert_eq!(report.final_state, State::Error);

        // Empty segments are flushed on dots, but not at the end.
        let report = analyze("..");
        assert_eq!(report.lexemes.len(), 2);
        assert!(report.lexemes.iter().all(|lexeme| !lexeme.valid));
        assert_eq!(report.final_state, State::Error);
    }

    #[test]
    fn multibyte_characters() {
        let report = analyze("añb.c.d");
        assert_eq!(report.lexemes[0].kind, LexemeKind::Error);
        assert_eq!(report.lexemes[0].value, "ñ");
        assert_eq!(report.lexemes[0].offset, 1);
        assert_eq!(report.lexemes[2].offset, 5);
    }

    #[test]
    fn automaton_transitions() {
        let dfa = JWT_AUTOMATON;
        assert_eq!(dfa.transition(State::Start, CharClass::Dot), State::Error);
        assert_eq!(dfa.transition(State::Header, CharClass::Dot), State::Payload);
        assert_eq!(dfa.transition(State::Payload, CharClass::Dot), State::Signature);
        assert_eq!(dfa.transition(State::Signature, CharClass::Dot), State::Error);
        assert_eq!(dfa.run("a.b.c"), State::Signature);
        assert_eq!(dfa.run(".a.b"), State::Error);
        assert!(dfa.is_accepting(dfa.run("a.b.c")));
    }

    #[test]
    fn automaton_serialization() {
        let value = serde_json::to_value(JWT_AUTOMATON).unwrap();
        assert_eq!(value["startState"], json!("q0"));
        assert_eq!(value["acceptStates"], json!(["qSignature"]));
        assert_eq!(
            value["states"],
            json!(["q0", "qHeader", "qPayload", "qSignature", "qError"])
        );
        assert_eq!(
            value["transitions"]["qHeader"],
            json!({ "base64url": "qHeader", ".": "qPayload" })
        );
        assert_eq!(
            value["transitions"]["q0"],
            json!({ "base64url": "qHeader", ".": "qError" })
        );
    }
}
