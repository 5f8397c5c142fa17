//! Named value generators ("fakers").
//!
//! A faker is a function of the seeded RNG, the asset pool, the clock and the
//! directive's positional arguments. Names are dotted (`name.firstName`,
//! `random.number`). Built-ins can be replaced and new ones registered, either
//! in code or from an extension document of pick-one lists.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use base64::Engine as _;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use serde_json::{json, Value};
use thiserror::Error;

use crate::assets::{AssetPool, PLACEHOLDER_IMAGE};
use crate::error::SynthesisError;
use crate::words;

const AUTHOR_POOL_SIZE: usize = 100;
const AUTHOR_POOL_SEED: u64 = 0x5a3e_a070;
const SIG_BYTES: usize = 128;
const HASH_BYTES: usize = 32;
const PUB_KEY_BYTES: usize = 33;
const MS_PER_DAY: i64 = 86_400_000;
const MS_PER_YEAR: i64 = 365 * MS_PER_DAY;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct FakerError(pub String);

impl FakerError {
    fn new(message: impl Into<String>) -> Self {
        FakerError(message.into())
    }
}

/// Everything a faker may draw on.
pub struct FakerContext<'a> {
    pub rng: &'a mut StdRng,
    pub assets: &'a dyn AssetPool,
    pub now: DateTime<Utc>,
}

pub type FakerFn =
    Arc<dyn Fn(&mut FakerContext<'_>, &[Value]) -> Result<Value, FakerError> + Send + Sync>;

#[derive(Clone, Default)]
pub struct FakerRegistry {
    fakers: BTreeMap<String, FakerFn>,
}

impl fmt::Debug for FakerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakerRegistry")
            .field("fakers", &self.fakers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FakerRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in vocabulary.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();

        // Key material and identifiers.
        registry
            .register("sig", sig)
            .register("sigPubKey", sig_pub_key)
            .register("hash", hash)
            .register("link", hash)
            .register("resource.type", resource_type);

        let authors = Arc::new(author_pool());
        registry.register("author", move |ctx, _| {
            authors
                .choose(ctx.rng)
                .map(|author| Value::String(author.clone()))
                .ok_or_else(|| FakerError::new("author pool is empty"))
        });

        // Time.
        registry
            .register("timestamp.recent", timestamp_recent)
            .register("date.recent", date_recent)
            .register("date.past", date_past)
            .register("date.future", date_future)
            .register("date.birthdate", date_birthdate);

        // People, places, companies.
        registry
            .register("name.firstName", |ctx, _| Ok(json!(pick(ctx.rng, words::FIRST_NAMES))))
            .register("name.lastName", |ctx, _| Ok(json!(pick(ctx.rng, words::LAST_NAMES))))
            .register("name.findName", |ctx, _| {
                let first = pick(ctx.rng, words::FIRST_NAMES);
                let last = pick(ctx.rng, words::LAST_NAMES);
                Ok(json!(format!("{first} {last}")))
            })
            .register("name.jobTitle", |ctx, _| {
                let descriptor = pick(ctx.rng, words::JOB_DESCRIPTORS);
                let area = pick(ctx.rng, words::JOB_AREAS);
                let kind = pick(ctx.rng, words::JOB_TYPES);
                Ok(json!(format!("{descriptor} {area} {kind}")))
            })
            .register("internet.email", internet_email)
            .register("internet.url", internet_url)
            .register("phone.phoneNumber", |ctx, _| {
                let block: u32 = ctx.rng.gen_range(0..1_000);
                let line: u32 = ctx.rng.gen_range(0..1_000_000);
                Ok(json!(format!("+44 7{block:03} {line:06}")))
            })
            .register("address.streetAddress", |ctx, _| {
                let number: u32 = ctx.rng.gen_range(1..300);
                let street = pick(ctx.rng, words::LAST_NAMES);
                let suffix = pick(ctx.rng, words::STREET_SUFFIXES);
                Ok(json!(format!("{number} {street} {suffix}")))
            })
            .register("address.city", |ctx, _| Ok(json!(pick(ctx.rng, words::CITIES))))
            .register("address.zipCode", |ctx, _| {
                Ok(json!(format!("{:05}", ctx.rng.gen_range(0..100_000u32))))
            })
            .register("address.country", |ctx, _| Ok(json!(pick(ctx.rng, words::COUNTRIES))))
            .register("company.companyName", company_name);

        // Text.
        registry
            .register("lorem.word", |ctx, _| Ok(json!(pick(ctx.rng, words::LOREM))))
            .register("lorem.words", |ctx, args| {
                let count = usize_arg(args, 0)?.unwrap_or(3);
                Ok(json!(lorem(ctx.rng, count)))
            })
            .register("lorem.sentence", |ctx, args| {
                let count = match usize_arg(args, 0)? {
                    Some(count) => count,
                    None => ctx.rng.gen_range(5..=10),
                };
                Ok(json!(sentence(ctx.rng, count)))
            });

        // Numbers and misc.
        registry
            .register("random.number", random_number)
            .register("random.boolean", |ctx, _| Ok(json!(ctx.rng.gen_bool(0.5))))
            .register("random.uuid", |ctx, _| {
                let bytes: [u8; 16] = ctx.rng.gen();
                Ok(json!(uuid::Builder::from_random_bytes(bytes).into_uuid().to_string()))
            })
            .register("random.alphaNumeric", |ctx, args| {
                let len = usize_arg(args, 0)?.unwrap_or(8);
                let text: String = (0..len)
                    .filter_map(|_| words::ALPHANUMERIC.choose(ctx.rng).map(|&b| b as char))
                    .collect();
                Ok(json!(text))
            })
            .register("random.arrayElement", random_array_element)
            .register("finance.account", |ctx, args| {
                let len = usize_arg(args, 0)?.unwrap_or(8);
                let digits: String = (0..len)
                    .map(|_| char::from(b'0' + ctx.rng.gen_range(0..10u8)))
                    .collect();
                Ok(json!(digits))
            })
            .register("finance.amount", finance_amount)
            .register("face", |ctx, _| {
                Ok(json!(ctx
                    .assets
                    .next()
                    .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string())))
            });

        registry
    }

    pub fn register<F>(&mut self, name: impl Into<String>, faker: F) -> &mut Self
    where
        F: Fn(&mut FakerContext<'_>, &[Value]) -> Result<Value, FakerError> + Send + Sync + 'static,
    {
        self.fakers.insert(name.into(), Arc::new(faker));
        self
    }

    /// Register a faker that picks one of `choices`.
    pub fn register_choices(&mut self, name: impl Into<String>, choices: Vec<Value>) -> &mut Self {
        let name = name.into();
        let label = name.clone();
        self.register(name, move |ctx, _| {
            choices
                .choose(ctx.rng)
                .cloned()
                .ok_or_else(|| FakerError::new(format!("`{label}` has no choices")))
        })
    }

    /// Load an extension document: `{ "<directive>": [choice, ...], ... }`.
    /// A scalar entry registers a faker that always yields it. Returns the
    /// registered names.
    pub fn extend_from_value(&mut self, value: &Value) -> Result<Vec<String>, FakerError> {
        let Some(entries) = value.as_object() else {
            return Err(FakerError::new(
                "faker extension must be an object of directive name -> choices",
            ));
        };
        let mut names = Vec::with_capacity(entries.len());
        for (name, choices) in entries {
            let choices = match choices {
                Value::Array(items) => items.clone(),
                other => vec![other.clone()],
            };
            if choices.is_empty() {
                return Err(FakerError::new(format!("`{name}` has no choices")));
            }
            self.register_choices(name.clone(), choices);
            names.push(name.clone());
        }
        tracing::debug!(fakers = names.len(), "registered faker extension");
        Ok(names)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fakers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fakers.keys().map(String::as_str)
    }

    pub fn invoke(
        &self,
        name: &str,
        ctx: &mut FakerContext<'_>,
        args: &[Value],
    ) -> Result<Value, SynthesisError> {
        let faker = self
            .fakers
            .get(name)
            .ok_or_else(|| SynthesisError::UnknownDirective {
                name: name.to_string(),
            })?;
        faker(ctx, args).map_err(|FakerError(message)| SynthesisError::InvalidDirectiveArguments {
            name: name.to_string(),
            message,
        })
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub(crate) fn random_hex(rng: &mut StdRng, bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rng.fill_bytes(&mut buf);
    hex::encode(buf)
}

fn pick(rng: &mut StdRng, options: &[&'static str]) -> &'static str {
    options.choose(rng).copied().unwrap_or_default()
}

fn int_arg(args: &[Value], idx: usize) -> Result<Option<i64>, FakerError> {
    let Some(value) = args.get(idx) else {
        return Ok(None);
    };
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f as i64))
        .map(Some)
        .ok_or_else(|| FakerError::new(format!("argument {idx} must be a number, got {value}")))
}

fn usize_arg(args: &[Value], idx: usize) -> Result<Option<usize>, FakerError> {
    match int_arg(args, idx)? {
        Some(n) if n < 0 => Err(FakerError::new(format!(
            "argument {idx} must not be negative, got {n}"
        ))),
        Some(n) => Ok(Some(n as usize)),
        None => Ok(None),
    }
}

/// `[max]`, `[min, max]` or `[{ "min": .., "max": .. }]`.
fn range_args(args: &[Value], default_min: i64, default_max: i64) -> Result<(i64, i64), FakerError> {
    let (min, max) = match args.first() {
        Some(Value::Object(bounds)) => {
            let bound = |key: &str, default: i64| match bounds.get(key) {
                Some(v) => v
                    .as_i64()
                    .ok_or_else(|| FakerError::new(format!("`{key}` must be an integer, got {v}"))),
                None => Ok(default),
            };
            (bound("min", default_min)?, bound("max", default_max)?)
        }
        _ if args.len() >= 2 => (
            int_arg(args, 0)?.unwrap_or(default_min),
            int_arg(args, 1)?.unwrap_or(default_max),
        ),
        _ => (default_min, int_arg(args, 0)?.unwrap_or(default_max)),
    };
    if min > max {
        return Err(FakerError::new(format!("empty range {min}..={max}")));
    }
    Ok((min, max))
}

fn rfc3339(at: DateTime<Utc>) -> Value {
    json!(at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn lorem(rng: &mut StdRng, count: usize) -> String {
    (0..count)
        .map(|_| pick(rng, words::LOREM))
        .collect::<Vec<_>>()
        .join(" ")
}

fn sentence(rng: &mut StdRng, count: usize) -> String {
    let text = lorem(rng, count.max(1));
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => format!("{}{}.", first.to_uppercase(), chars.as_str()),
        None => String::new(),
    }
}

fn author_pool() -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(AUTHOR_POOL_SEED);
    (0..AUTHOR_POOL_SIZE)
        .map(|_| random_hex(&mut rng, HASH_BYTES))
        .collect()
}

// ============================================================================
// Built-ins
// ============================================================================

fn sig(ctx: &mut FakerContext<'_>, _args: &[Value]) -> Result<Value, FakerError> {
    let mut buf = vec![0u8; SIG_BYTES];
    ctx.rng.fill_bytes(&mut buf);
    Ok(json!(base64::engine::general_purpose::STANDARD.encode(buf)))
}

fn sig_pub_key(ctx: &mut FakerContext<'_>, _args: &[Value]) -> Result<Value, FakerError> {
    Ok(json!(random_hex(ctx.rng, PUB_KEY_BYTES)))
}

fn hash(ctx: &mut FakerContext<'_>, _args: &[Value]) -> Result<Value, FakerError> {
    Ok(json!(random_hex(ctx.rng, HASH_BYTES)))
}

fn resource_type(_ctx: &mut FakerContext<'_>, args: &[Value]) -> Result<Value, FakerError> {
    match args.first() {
        Some(Value::String(id)) => Ok(json!(id)),
        _ => Err(FakerError::new("expected the model id as the only argument")),
    }
}

/// Epoch millis within the last `days` (default 30).
fn timestamp_recent(ctx: &mut FakerContext<'_>, args: &[Value]) -> Result<Value, FakerError> {
    let days = int_arg(args, 0)?.unwrap_or(30).max(1);
    let ago = ctx.rng.gen_range(0..days * MS_PER_DAY);
    Ok(json!((ctx.now - Duration::milliseconds(ago)).timestamp_millis()))
}

fn date_recent(ctx: &mut FakerContext<'_>, args: &[Value]) -> Result<Value, FakerError> {
    let days = int_arg(args, 0)?.unwrap_or(1).max(1);
    let ago = ctx.rng.gen_range(0..days * MS_PER_DAY);
    Ok(rfc3339(ctx.now - Duration::milliseconds(ago)))
}

fn date_past(ctx: &mut FakerContext<'_>, args: &[Value]) -> Result<Value, FakerError> {
    let years = int_arg(args, 0)?.unwrap_or(1).max(1);
    let ago = ctx.rng.gen_range(1..years * MS_PER_YEAR);
    Ok(rfc3339(ctx.now - Duration::milliseconds(ago)))
}

fn date_future(ctx: &mut FakerContext<'_>, args: &[Value]) -> Result<Value, FakerError> {
    let years = int_arg(args, 0)?.unwrap_or(1).max(1);
    let ahead = ctx.rng.gen_range(1..years * MS_PER_YEAR);
    Ok(rfc3339(ctx.now + Duration::milliseconds(ahead)))
}

/// Calendar date for an age in `[min, max]` years (default 18..=80).
fn date_birthdate(ctx: &mut FakerContext<'_>, args: &[Value]) -> Result<Value, FakerError> {
    let (min_age, max_age) = range_args(args, 18, 80)?;
    let ago = ctx
        .rng
        .gen_range(min_age * MS_PER_YEAR..=max_age * MS_PER_YEAR);
    let born = ctx.now - Duration::milliseconds(ago);
    Ok(json!(born.format("%Y-%m-%d").to_string()))
}

fn internet_email(ctx: &mut FakerContext<'_>, _args: &[Value]) -> Result<Value, FakerError> {
    let first = pick(ctx.rng, words::FIRST_NAMES).to_lowercase();
    let last = pick(ctx.rng, words::LAST_NAMES).to_lowercase();
    let n: u32 = ctx.rng.gen_range(1..100);
    let domain = pick(ctx.rng, words::EMAIL_DOMAINS);
    Ok(json!(format!("{first}.{last}{n}@{domain}")))
}

fn internet_url(ctx: &mut FakerContext<'_>, _args: &[Value]) -> Result<Value, FakerError> {
    let a = pick(ctx.rng, words::LOREM);
    let b = pick(ctx.rng, words::LOREM);
    let tld = pick(ctx.rng, words::TLDS);
    Ok(json!(format!("https://www.{a}{b}.{tld}")))
}

fn company_name(ctx: &mut FakerContext<'_>, _args: &[Value]) -> Result<Value, FakerError> {
    let name = match ctx.rng.gen_range(0..3) {
        0 => format!(
            "{} {}",
            pick(ctx.rng, words::LAST_NAMES),
            pick(ctx.rng, words::COMPANY_SUFFIXES)
        ),
        1 => format!(
            "{}-{}",
            pick(ctx.rng, words::LAST_NAMES),
            pick(ctx.rng, words::LAST_NAMES)
        ),
        _ => format!(
            "{}, {} and {}",
            pick(ctx.rng, words::LAST_NAMES),
            pick(ctx.rng, words::LAST_NAMES),
            pick(ctx.rng, words::LAST_NAMES)
        ),
    };
    Ok(json!(name))
}

fn random_number(ctx: &mut FakerContext<'_>, args: &[Value]) -> Result<Value, FakerError> {
    let (min, max) = range_args(args, 0, 99_999)?;
    Ok(json!(ctx.rng.gen_range(min..=max)))
}

/// `[[a, b, c]]` or `[a, b, c]`.
fn random_array_element(ctx: &mut FakerContext<'_>, args: &[Value]) -> Result<Value, FakerError> {
    let choices = match args {
        [Value::Array(items)] => items.as_slice(),
        other => other,
    };
    choices
        .choose(ctx.rng)
        .cloned()
        .ok_or_else(|| FakerError::new("expected a non-empty list of choices"))
}

/// Two-decimal amount in `[min, max]` (default 0..=1000).
fn finance_amount(ctx: &mut FakerContext<'_>, args: &[Value]) -> Result<Value, FakerError> {
    let (min, max) = range_args(args, 0, 1_000)?;
    let cents = ctx.rng.gen_range(min * 100..=max * 100);
    Ok(json!(cents as f64 / 100.0))
}
