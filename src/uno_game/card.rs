use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Yellow,
    Green,
    Blue,
    Wild,
}

impl Color {
    /// The four colors a wild card may be assigned.
    pub const BASE: [Color; 4] = [Color::Red, Color::Yellow, Color::Green, Color::Blue];

    pub fn is_base(self) -> bool {
        self != Color::Wild
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Color::Red => "red",
            Color::Yellow => "yellow",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Wild => "wild",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "red" => Ok(Color::Red),
            "yellow" => Ok(Color::Yellow),
            "green" => Ok(Color::Green),
            "blue" => Ok(Color::Blue),
            "wild" => Ok(Color::Wild),
            other => Err(format!("unknown color '{}'", other)),
        }
    }
}

/// Face value of a card. Serialized as the short strings clients expect
/// ("0".."9", "skip", "reverse", "draw2", "wild", "wild4").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum CardType {
    Number(u8),
    Skip,
    Reverse,
    DrawTwo,
    Wild,
    WildDrawFour,
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardType::Number(n) => write!(f, "{}", n),
            CardType::Skip => write!(f, "skip"),
            CardType::Reverse => write!(f, "reverse"),
            CardType::DrawTwo => write!(f, "draw2"),
            CardType::Wild => write!(f, "wild"),
            CardType::WildDrawFour => write!(f, "wild4"),
        }
    }
}

impl FromStr for CardType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skip" => Ok(CardType::Skip),
            "reverse" => Ok(CardType::Reverse),
            "draw2" => Ok(CardType::DrawTwo),
            "wild" => Ok(CardType::Wild),
            "wild4" => Ok(CardType::WildDrawFour),
            _ => match s.parse::<u8>() {
                Ok(n) if n <= 9 => Ok(CardType::Number(n)),
                _ => Err(format!("unknown card value '{}'", s)),
            },
        }
    }
}

impl From<CardType> for String {
    fn from(card_type: CardType) -> Self {
        card_type.to_string()
    }
}

impl TryFrom<String> for CardType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub color: Color,
    #[serde(rename = "value")]
    pub card_type: CardType,
}

impl Card {
    pub fn new(color: Color, card_type: CardType) -> Self {
        Self { color, card_type }
    }

    pub fn is_wild(&self) -> bool {
        self.color == Color::Wild
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.color, self.card_type)
    }
}

/// Checks whether `card` may be placed on `top` while `active_color` is in force.
///
/// Wild cards are always playable. On top of a wild, only the color chosen
/// for it matches; otherwise color or face value must match.
pub fn can_play(card: &Card, top: &Card, active_color: Option<Color>) -> bool {
    if card.is_wild() {
        return true;
    }

    if top.is_wild() {
        return Some(card.color) == active_color;
    }

    card.color == top.color || card.card_type == top.card_type
}
