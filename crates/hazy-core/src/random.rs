//! Random data for `|~category:subtype|` expressions.
//!
//! The catalog of categories and subtypes is fixed. Values come from a
//! [`RandomProvider`]; [`RandomGenerator`] validates requests against the
//! catalog before delegating, so lookup failures always enumerate the valid
//! choices.
//!
//! # Examples
//!
//! ```
//! use hazy_core::random::RandomGenerator;
//!
//! let random = RandomGenerator::seeded(1);
//! assert!(random.generate("basic:bool").unwrap().is_boolean());
//! assert!(random.generate("basic:nope").is_err());
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use base64::Engine as _;
use chrono::{DateTime, Utc};
use fake::faker::address::en::{
    BuildingNumber, CityName, CountryName, StateAbbr, StreetName, ZipCode,
};
use fake::faker::internet::en::{DomainSuffix, IPv4, IPv6, SafeEmail};
use fake::faker::lorem::en::{Paragraph, Sentence, Word};
use fake::faker::name::en::{FirstName, LastName, Name, Suffix, Title};
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;

use crate::error::{HazyError, Result};
use crate::value::Fixture;

/// Largest integer a JSON number round-trips exactly through a double.
const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

const CHAR_POOL: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*()[]";
const GEOHASH_ALPHABET: &[u8] = b"0123456789bcdefghjkmnpqrstuvwxyz";
const CONSONANTS: &[u8] = b"bcdfghjklmnprstvwz";
const VOWELS: &[u8] = b"aeiou";
const PROVINCES: &[&str] = &[
    "AB", "BC", "MB", "NB", "NL", "NS", "ON", "PE", "QC", "SK", "NT", "NU", "YT",
];
const MONTHS: &[&str] = &[
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

/// A random data category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Booleans, characters, numbers and strings.
    Basic,
    /// Words, sentences and paragraphs.
    Text,
    /// Names and personal identifiers.
    Person,
    /// Mobile device identifiers.
    Mobile,
    /// Internet identifiers.
    Web,
    /// Addresses and coordinates.
    Geo,
    /// Dates and clock values.
    Time,
    /// Everything else.
    Misc,
}

impl Category {
    /// All categories in catalog order.
    pub const ALL: [Self; 8] = [
        Self::Basic,
        Self::Text,
        Self::Person,
        Self::Mobile,
        Self::Web,
        Self::Geo,
        Self::Time,
        Self::Misc,
    ];

    /// Returns the name used in expressions.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Text => "text",
            Self::Person => "person",
            Self::Mobile => "mobile",
            Self::Web => "web",
            Self::Geo => "geo",
            Self::Time => "time",
            Self::Misc => "misc",
        }
    }

    /// Returns the subtypes this category supports.
    #[must_use]
    pub const fn subtypes(self) -> &'static [&'static str] {
        match self {
            Self::Basic => &["bool", "character", "integer", "natural", "string"],
            Self::Text => &["paragraph", "sentence", "syllable", "word"],
            Self::Person => &[
                "age", "birthday", "cpf", "first", "gender", "last", "name", "prefix", "ssn",
                "suffix",
            ],
            Self::Mobile => &["android_id", "apple_token", "bb_pin", "wp7_anid", "wp8_anid2"],
            Self::Web => &[
                "color",
                "domain",
                "email",
                "fbid",
                "google_analytics",
                "hashtag",
                "ip",
                "ipv6",
                "klout",
                "tld",
                "twitter",
                "url",
            ],
            Self::Geo => &[
                "address",
                "altitude",
                "areacode",
                "city",
                "coordinates",
                "country",
                "depth",
                "geohash",
                "latitude",
                "longitude",
                "phone",
                "postal",
                "province",
                "state",
                "street",
                "zip",
            ],
            Self::Time => &[
                "ampm",
                "date",
                "hammertime",
                "hour",
                "millisecond",
                "minute",
                "month",
                "second",
                "timestamp",
                "year",
            ],
            Self::Misc => &["guid", "hash", "normal", "radio", "tv"],
        }
    }

    /// Returns true if `subtype` belongs to this category.
    #[must_use]
    pub fn supports(self, subtype: &str) -> bool {
        self.subtypes().contains(&subtype)
    }

    fn unknown_subtype(self, subtype: &str) -> HazyError {
        HazyError::UnknownSubtype {
            category: self.name().to_string(),
            subtype: subtype.to_string(),
            supported: self.subtypes().iter().map(ToString::to_string).collect(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = HazyError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.name() == s)
            .ok_or_else(|| HazyError::UnknownCategory {
                category: s.to_string(),
                supported: Self::ALL.iter().map(|c| c.name().to_string()).collect(),
            })
    }
}

/// A parsed `category:subtype` operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomSpec {
    /// Category name as written.
    pub category: String,
    /// Subtype name as written. Empty when no `:` was given.
    pub subtype: String,
}

impl RandomSpec {
    /// Splits an operand on `:` and trims both halves.
    #[must_use]
    pub fn parse(operand: &str) -> Self {
        let mut parts = operand.split(':');
        let category = parts.next().unwrap_or_default().trim().to_string();
        let subtype = parts.next().unwrap_or_default().trim().to_string();
        Self { category, subtype }
    }
}

/// Source of generated values.
///
/// Implementations only need to handle subtypes listed in the catalog;
/// validation happens in [`RandomGenerator`].
pub trait RandomProvider: Send + Sync + fmt::Debug {
    /// Produces one value, or `None` if the subtype is not supported.
    fn generate(&self, category: Category, subtype: &str) -> Option<Fixture>;
}

/// Catalog-validating front for a [`RandomProvider`].
#[derive(Debug, Clone)]
pub struct RandomGenerator {
    provider: Arc<dyn RandomProvider>,
}

impl RandomGenerator {
    /// Wraps a provider.
    #[must_use]
    pub fn new(provider: Arc<dyn RandomProvider>) -> Self {
        Self { provider }
    }

    /// Uses a [`FakeProvider`] seeded with `seed`, or from entropy when `None`.
    #[must_use]
    pub fn with_seed(seed: Option<u64>) -> Self {
        Self::new(Arc::new(FakeProvider::new(seed)))
    }

    /// Uses a [`FakeProvider`] seeded with `seed`.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::with_seed(Some(seed))
    }

    /// Generates a value for a `category:subtype` operand.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if the category or subtype is unknown.
    pub fn generate(&self, operand: &str) -> Result<Fixture> {
        let spec = RandomSpec::parse(operand);
        let category: Category = spec.category.parse()?;
        self.generate_typed(category, &spec.subtype)
    }

    /// Generates a value for an already-parsed category.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if the subtype is unknown for the category.
    pub fn generate_typed(&self, category: Category, subtype: &str) -> Result<Fixture> {
        if !category.supports(subtype) {
            return Err(category.unknown_subtype(subtype));
        }
        self.provider
            .generate(category, subtype)
            .ok_or_else(|| category.unknown_subtype(subtype))
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self::with_seed(None)
    }
}

/// Default provider backed by `fake` and `rand`.
#[derive(Debug)]
pub struct FakeProvider {
    rng: Mutex<StdRng>,
}

impl FakeProvider {
    /// Creates a provider, deterministic when a seed is given.
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self {
            rng: Mutex::new(rng),
        }
    }
}

impl RandomProvider for FakeProvider {
    fn generate(&self, category: Category, subtype: &str) -> Option<Fixture> {
        let mut rng = self.rng.lock();
        let rng = &mut *rng;
        match category {
            Category::Basic => basic(rng, subtype),
            Category::Text => text(rng, subtype),
            Category::Person => person(rng, subtype),
            Category::Mobile => mobile(rng, subtype),
            Category::Web => web(rng, subtype),
            Category::Geo => geo(rng, subtype),
            Category::Time => time(rng, subtype),
            Category::Misc => misc(rng, subtype),
        }
    }
}

fn basic(rng: &mut StdRng, subtype: &str) -> Option<Fixture> {
    let value = match subtype {
        "bool" => Value::Bool(rng.gen_bool(0.5)),
        "character" => Value::String(pick_chars(rng, CHAR_POOL, 1)),
        "integer" => Value::from(rng.gen_range(-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER)),
        "natural" => Value::from(rng.gen_range(0..=MAX_SAFE_INTEGER)),
        "string" => {
            let len = rng.gen_range(5..=20);
            Value::String(pick_chars(rng, CHAR_POOL, len))
        }
        _ => return None,
    };
    Some(value)
}

fn text(rng: &mut StdRng, subtype: &str) -> Option<Fixture> {
    let value: String = match subtype {
        "paragraph" => Paragraph(3..7).fake_with_rng(rng),
        "sentence" => Sentence(5..12).fake_with_rng(rng),
        "syllable" => syllable(rng),
        "word" => Word().fake_with_rng(rng),
        _ => return None,
    };
    Some(Value::String(value))
}

fn person(rng: &mut StdRng, subtype: &str) -> Option<Fixture> {
    let value = match subtype {
        "age" => Value::from(rng.gen_range(1..=100)),
        "birthday" => {
            let now = Utc::now().timestamp();
            let secs = rng.gen_range(now - 100 * 365 * 86_400..now);
            Value::String(
                DateTime::<Utc>::from_timestamp(secs, 0)?
                    .format("%Y-%m-%d")
                    .to_string(),
            )
        }
        "cpf" => Value::String(cpf(rng)),
        "first" => Value::String(FirstName().fake_with_rng(rng)),
        "gender" => Value::String(if rng.gen_bool(0.5) { "Male" } else { "Female" }.to_string()),
        "last" => Value::String(LastName().fake_with_rng(rng)),
        "name" => Value::String(Name().fake_with_rng(rng)),
        "prefix" => Value::String(Title().fake_with_rng(rng)),
        "ssn" => Value::String(format!(
            "{}-{}-{}",
            digits(rng, 3),
            digits(rng, 2),
            digits(rng, 4)
        )),
        "suffix" => Value::String(Suffix().fake_with_rng(rng)),
        _ => return None,
    };
    Some(value)
}

fn mobile(rng: &mut StdRng, subtype: &str) -> Option<Fixture> {
    let value = match subtype {
        "android_id" => {
            let tail = pick_chars(rng, b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ-_", 178);
            format!("APA91{tail}")
        }
        "apple_token" => hex_string(rng, 64),
        "bb_pin" => hex_string(rng, 8),
        "wp7_anid" => format!(
            "A={}&E={}&W={}",
            hex_string(rng, 32).to_uppercase(),
            hex_string(rng, 3),
            rng.gen_range(0..=9)
        ),
        "wp8_anid2" => base64::engine::general_purpose::STANDARD.encode(hex_string(rng, 32)),
        _ => return None,
    };
    Some(Value::String(value))
}

fn web(rng: &mut StdRng, subtype: &str) -> Option<Fixture> {
    let value = match subtype {
        "color" => Value::String(format!("#{:06x}", rng.gen_range(0..0x0100_0000))),
        "domain" => Value::String(domain(rng)),
        "email" => Value::String(SafeEmail().fake_with_rng(rng)),
        "fbid" => Value::String(format!("10000{}", digits(rng, 11))),
        "google_analytics" => {
            Value::String(format!("UA-{}-{}", digits(rng, 6), digits(rng, 2)))
        }
        "hashtag" => Value::String(format!("#{}", Word().fake_with_rng::<String, _>(rng))),
        "ip" => Value::String(IPv4().fake_with_rng(rng)),
        "ipv6" => Value::String(IPv6().fake_with_rng(rng)),
        "klout" => Value::from(rng.gen_range(1..=99)),
        "tld" => Value::String(DomainSuffix().fake_with_rng(rng)),
        "twitter" => Value::String(format!("@{}", Word().fake_with_rng::<String, _>(rng))),
        "url" => {
            let host = domain(rng);
            let path: String = Word().fake_with_rng(rng);
            Value::String(format!("http://{host}/{path}"))
        }
        _ => return None,
    };
    Some(value)
}

fn geo(rng: &mut StdRng, subtype: &str) -> Option<Fixture> {
    let value = match subtype {
        "address" => {
            let number: String = BuildingNumber().fake_with_rng(rng);
            let street: String = StreetName().fake_with_rng(rng);
            Value::String(format!("{number} {street}"))
        }
        "altitude" => float(rng.gen_range(0.0..8848.0)),
        "areacode" => Value::String(format!("({})", area_code(rng))),
        "city" => Value::String(CityName().fake_with_rng(rng)),
        "coordinates" => {
            let lat = round5(rng.gen_range(-90.0..90.0));
            let long = round5(rng.gen_range(-180.0..180.0));
            Value::String(format!("{lat}, {long}"))
        }
        "country" => Value::String(CountryName().fake_with_rng(rng)),
        "depth" => float(rng.gen_range(-10994.0..0.0)),
        "geohash" => Value::String(pick_chars(rng, GEOHASH_ALPHABET, 7)),
        "latitude" => float(rng.gen_range(-90.0..90.0)),
        "longitude" => float(rng.gen_range(-180.0..180.0)),
        "phone" => Value::String(PhoneNumber().fake_with_rng(rng)),
        "postal" => Value::String(postal(rng)),
        "province" => Value::String(PROVINCES[rng.gen_range(0..PROVINCES.len())].to_string()),
        "state" => Value::String(StateAbbr().fake_with_rng(rng)),
        "street" => Value::String(StreetName().fake_with_rng(rng)),
        "zip" => Value::String(ZipCode().fake_with_rng(rng)),
        _ => return None,
    };
    Some(value)
}

fn time(rng: &mut StdRng, subtype: &str) -> Option<Fixture> {
    let now = Utc::now().timestamp();
    let value = match subtype {
        "ampm" => Value::String(if rng.gen_bool(0.5) { "am" } else { "pm" }.to_string()),
        "date" => {
            let secs = rng.gen_range(0..now);
            Value::String(DateTime::<Utc>::from_timestamp(secs, 0)?.to_rfc3339())
        }
        "hammertime" => Value::from(rng.gen_range(1..now) * 1000),
        "hour" => Value::from(rng.gen_range(1..=12)),
        "millisecond" => Value::from(rng.gen_range(0..1000)),
        "minute" | "second" => Value::from(rng.gen_range(0..60)),
        "month" => Value::String(MONTHS[rng.gen_range(0..MONTHS.len())].to_string()),
        "timestamp" => Value::from(rng.gen_range(1..now)),
        "year" => Value::String(rng.gen_range(1900..=2100).to_string()),
        _ => return None,
    };
    Some(value)
}

fn misc(rng: &mut StdRng, subtype: &str) -> Option<Fixture> {
    let value = match subtype {
        "guid" => Value::String(uuid::Builder::from_random_bytes(rng.gen()).into_uuid().to_string()),
        "hash" => Value::String(hex_string(rng, 40)),
        "normal" => float(normal(rng)),
        "radio" => Value::String(call_sign(rng, 3)),
        "tv" => {
            let len = rng.gen_range(3..=4);
            Value::String(call_sign(rng, len))
        }
        _ => return None,
    };
    Some(value)
}

fn pick_chars(rng: &mut StdRng, pool: &[u8], len: usize) -> String {
    (0..len)
        .map(|_| char::from(pool[rng.gen_range(0..pool.len())]))
        .collect()
}

fn digits(rng: &mut StdRng, len: usize) -> String {
    pick_chars(rng, b"0123456789", len)
}

fn hex_string(rng: &mut StdRng, len: usize) -> String {
    let bytes: Vec<u8> = (0..len.div_ceil(2)).map(|_| rng.gen()).collect();
    let mut encoded = hex::encode(bytes);
    encoded.truncate(len);
    encoded
}

fn syllable(rng: &mut StdRng) -> String {
    let mut out = String::new();
    for i in 0..rng.gen_range(2..=3) {
        let pool = if i % 2 == 0 { CONSONANTS } else { VOWELS };
        out.push(char::from(pool[rng.gen_range(0..pool.len())]));
    }
    out
}

fn domain(rng: &mut StdRng) -> String {
    let name: String = Word().fake_with_rng(rng);
    let tld: String = DomainSuffix().fake_with_rng(rng);
    format!("{name}.{tld}")
}

fn area_code(rng: &mut StdRng) -> String {
    // North American area codes never start with 0 or 1.
    format!("{}{}", rng.gen_range(2..=9), digits(rng, 2))
}

fn postal(rng: &mut StdRng) -> String {
    let letters = b"ABCEGHJKLMNPRSTVXY";
    format!(
        "{}{}{} {}{}{}",
        pick_chars(rng, letters, 1),
        rng.gen_range(0..=9),
        pick_chars(rng, letters, 1),
        rng.gen_range(0..=9),
        pick_chars(rng, letters, 1),
        rng.gen_range(0..=9)
    )
}

fn call_sign(rng: &mut StdRng, len: usize) -> String {
    let prefix = if rng.gen_bool(0.5) { 'K' } else { 'W' };
    let rest = pick_chars(rng, b"ABCDEFGHIJKLMNOPQRSTUVWXYZ", len.saturating_sub(1));
    format!("{prefix}{rest}")
}

/// Brazilian CPF with valid check digits.
fn cpf(rng: &mut StdRng) -> String {
    let mut n: Vec<u32> = (0..9).map(|_| rng.gen_range(0..=9)).collect();
    for weight_start in [10, 11] {
        let sum: u32 = n
            .iter()
            .zip((2..=weight_start).rev())
            .map(|(d, w)| d * w)
            .sum();
        let check = 11 - sum % 11;
        n.push(if check >= 10 { 0 } else { check });
    }
    let s: String = n.iter().map(ToString::to_string).collect();
    format!("{}.{}.{}-{}", &s[0..3], &s[3..6], &s[6..9], &s[9..11])
}

/// Standard normal sample (Box-Muller).
fn normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

fn round5(x: f64) -> f64 {
    (x * 100_000.0).round() / 100_000.0
}

fn float(x: f64) -> Fixture {
    serde_json::Number::from_f64(round5(x)).map_or(Value::Null, Value::Number)
}
