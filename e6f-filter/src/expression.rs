//! Single blacklist clause
//!
//! # Syntax
//! A clause is one whitespace-delimited token of a blacklist line:
//!
//! ```text
//! [~][-][field:][operator]value
//! ```
//!
//! * `~` marks the clause as optional (see [`FilterSet`](crate::filter::FilterSet)).
//! * `-` inverts the clause.
//! * `field:` selects what is compared, e.g. `score:`, `rating:` or `gentags:`. Tokens without
//!   a known field are plain tags.
//! * `operator` is one of `<=`, `>=`, `<`, `>` or `=`. A value written as `a...b` is an
//!   inclusive range instead. Plain tags never take an operator.
//!
//! Tags may contain `*`, which matches any run of non-whitespace characters.
//!
//! Parsing never fails. A clause that can't be understood is kept, but it never matches
//! a post (and so always matches when inverted).
use e6f_common::post::{extension::Extension, rating::Rating, tags::TagCategory, PostData};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Display;

/// The post attribute a clause looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Tag,
    Id,
    Score,
    /// Whether the current user favorited the post.
    Favorited,
    FavCount,
    Rating,
    Status,
    /// Uploader id or name.
    Uploader,
    Approver,
    Height,
    Width,
    FileSize,
    FileType,
    Duration,
    AspectRatio,
    TagCount,
    CategoryTagCount(TagCategory),
    HasParent,
    HasChild,
}

impl FilterField {
    const fn is_boolean(self) -> bool {
        matches!(self, Self::Favorited | Self::HasParent | Self::HasChild)
    }
}

/// Comparison applied between the post attribute and the clause value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equals,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    /// Inclusive `min...max`, in either order.
    Range,
}

impl Comparison {
    const fn symbol(self) -> &'static str {
        match self {
            Self::Equals | Self::Range => "",
            Self::Less => "<",
            Self::LessOrEqual => "<=",
            Self::Greater => ">",
            Self::GreaterOrEqual => ">=",
        }
    }
}

/// Known field prefixes, longest first so that no prefix shadows a longer one.
static FIELD_PREFIXES: Lazy<Vec<(&'static str, FilterField)>> = Lazy::new(|| {
    let mut prefixes = vec![
        ("id:", FilterField::Id),
        ("score:", FilterField::Score),
        ("fav:", FilterField::Favorited),
        ("isfav:", FilterField::Favorited),
        ("favcount:", FilterField::FavCount),
        ("rating:", FilterField::Rating),
        ("status:", FilterField::Status),
        ("uploader:", FilterField::Uploader),
        ("user:", FilterField::Uploader),
        ("userid:", FilterField::Uploader),
        ("approver:", FilterField::Approver),
        ("height:", FilterField::Height),
        ("width:", FilterField::Width),
        ("filesize:", FilterField::FileSize),
        ("type:", FilterField::FileType),
        ("filetype:", FilterField::FileType),
        ("duration:", FilterField::Duration),
        ("ratio:", FilterField::AspectRatio),
        ("tagcount:", FilterField::TagCount),
        ("arttags:", FilterField::CategoryTagCount(TagCategory::Artist)),
        ("copytags:", FilterField::CategoryTagCount(TagCategory::Copyright)),
        ("spectags:", FilterField::CategoryTagCount(TagCategory::Species)),
        ("chartags:", FilterField::CategoryTagCount(TagCategory::Character)),
        ("gentags:", FilterField::CategoryTagCount(TagCategory::General)),
        ("invtags:", FilterField::CategoryTagCount(TagCategory::Invalid)),
        ("metatags:", FilterField::CategoryTagCount(TagCategory::Meta)),
        ("lortags:", FilterField::CategoryTagCount(TagCategory::Lore)),
        ("ischild:", FilterField::HasParent),
        ("isparent:", FilterField::HasChild),
    ];
    prefixes.sort_by_key(|(prefix, _)| std::cmp::Reverse(prefix.len()));
    prefixes
});

/// Operators in match priority: the two-character ones before their one-character prefixes.
const OPERATORS: [(&str, Comparison); 5] = [
    ("<=", Comparison::LessOrEqual),
    (">=", Comparison::GreaterOrEqual),
    ("<", Comparison::Less),
    (">", Comparison::Greater),
    ("=", Comparison::Equals),
];

const RANGE_SEPARATOR: &str = "...";

#[derive(Debug, Clone)]
enum TagMatcher {
    Exact(String),
    Wildcard(Regex),
}

/// Clause value, converted once at parse time to the type its field compares against.
#[derive(Debug, Clone)]
enum FilterValue {
    Tag(TagMatcher),
    Number(f64),
    Range(f64, f64),
    Bool(bool),
    Rating(Rating),
    FileType(Extension),
    Text(String),
    /// Literal that makes no sense for the field. Never matches.
    Discarded,
}

/// One parsed clause of a blacklist line.
#[derive(Debug, Clone)]
pub struct FilterExpression {
    field: FilterField,
    comparison: Comparison,
    raw_value: String,
    value: FilterValue,
    inverted: bool,
    optional: bool,
}

impl FilterExpression {
    /// Parses one lower-cased token. Never fails.
    pub fn parse(token: &str) -> Self {
        let mut rest = token.trim();

        let optional = match rest.strip_prefix('~') {
            Some(stripped) => {
                rest = stripped;
                true
            }
            None => false,
        };

        let inverted = match rest.strip_prefix('-') {
            Some(stripped) => {
                rest = stripped;
                true
            }
            None => false,
        };

        let (field, rest) = FIELD_PREFIXES
            .iter()
            .find_map(|(prefix, field)| rest.strip_prefix(prefix).map(|r| (*field, r)))
            .unwrap_or((FilterField::Tag, rest));

        let (comparison, literal) = if field == FilterField::Tag {
            (Comparison::Equals, rest)
        } else {
            split_comparison(rest)
        };

        Self::build(field, comparison, literal, inverted, optional)
    }

    /// Builds an inverted, required clause directly from a field and literal.
    ///
    /// Used for clauses injected by the blacklist itself rather than typed by the user.
    pub fn excluding(field: FilterField, literal: &str) -> Self {
        let (comparison, literal) = if field == FilterField::Tag {
            (Comparison::Equals, literal)
        } else {
            split_comparison(literal)
        };
        Self::build(field, comparison, literal, true, false)
    }

    fn build(
        field: FilterField,
        comparison: Comparison,
        literal: &str,
        inverted: bool,
        optional: bool,
    ) -> Self {
        let value = parse_value(field, comparison, literal);

        let raw_value = match &value {
            FilterValue::Bool(b) => b.to_string(),
            FilterValue::Number(n) if field == FilterField::FileSize => format!("{n}"),
            FilterValue::Range(min, max) if field == FilterField::FileSize => {
                format!("{min}{RANGE_SEPARATOR}{max}")
            }
            _ => literal.to_string(),
        };

        Self {
            field,
            comparison,
            raw_value,
            value,
            inverted,
            optional,
        }
    }

    #[inline]
    pub const fn field(&self) -> FilterField {
        self.field
    }

    #[inline]
    pub const fn comparison(&self) -> Comparison {
        self.comparison
    }

    /// The literal value, after type-specific normalization.
    #[inline]
    pub fn raw_value(&self) -> &str {
        &self.raw_value
    }

    #[inline]
    pub const fn is_inverted(&self) -> bool {
        self.inverted
    }

    #[inline]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }

    /// Evaluates the clause against a post, inversion included.
    #[inline]
    pub fn matches(&self, post: &PostData) -> bool {
        self.test(post) != self.inverted
    }

    fn test(&self, post: &PostData) -> bool {
        if matches!(self.value, FilterValue::Discarded) {
            return false;
        }

        match self.field {
            FilterField::Tag => match &self.value {
                FilterValue::Tag(TagMatcher::Exact(tag)) => post.tags.contains(tag),
                FilterValue::Tag(TagMatcher::Wildcard(re)) => {
                    post.tags.all().iter().any(|tag| re.is_match(tag))
                }
                _ => false,
            },
            FilterField::Id => self.compare(post.id as f64),
            FilterField::Score => self.compare(post.score as f64),
            FilterField::FavCount => self.compare(post.favorites as f64),
            FilterField::Height => self.compare(f64::from(post.file.height)),
            FilterField::Width => self.compare(f64::from(post.file.width)),
            FilterField::FileSize => self.compare(post.file.size as f64),
            FilterField::TagCount => self.compare(post.tags.len() as f64),
            FilterField::Duration => post
                .file
                .duration
                .is_some_and(|duration| self.compare(duration)),
            FilterField::AspectRatio => post
                .file
                .ratio()
                .is_some_and(|ratio| self.compare((ratio * 100.0).round() / 100.0)),
            FilterField::CategoryTagCount(category) => post
                .tags
                .category_count(category)
                .is_some_and(|count| self.compare(count as f64)),
            FilterField::Favorited => self.flag(post.is_favorited),
            FilterField::HasParent => self.flag(post.has_parent),
            FilterField::HasChild => self.flag(post.has_children),
            FilterField::Rating => {
                matches!(self.value, FilterValue::Rating(rating) if rating == post.rating)
            }
            FilterField::FileType => {
                matches!(self.value, FilterValue::FileType(ext) if ext == post.file.extension)
            }
            FilterField::Status => match &self.value {
                FilterValue::Text(status) => post.flags.has_status(status).unwrap_or(false),
                _ => false,
            },
            FilterField::Uploader => match &self.value {
                FilterValue::Number(_) | FilterValue::Range(..) => {
                    self.compare(post.uploader as f64)
                }
                FilterValue::Text(name) => post
                    .uploader_name
                    .as_deref()
                    .is_some_and(|uploader| uploader.eq_ignore_ascii_case(name)),
                _ => false,
            },
            FilterField::Approver => match (&self.value, post.approver) {
                (FilterValue::Text(keyword), approver) => match keyword.as_str() {
                    "none" => approver.is_none(),
                    "any" => approver.is_some(),
                    _ => false,
                },
                (_, Some(approver)) => self.compare(approver as f64),
                (_, None) => false,
            },
        }
    }

    fn compare(&self, actual: f64) -> bool {
        match (self.comparison, &self.value) {
            (Comparison::Range, FilterValue::Range(min, max)) => *min <= actual && actual <= *max,
            (Comparison::Equals, FilterValue::Number(v)) => actual == *v,
            (Comparison::Less, FilterValue::Number(v)) => actual < *v,
            (Comparison::LessOrEqual, FilterValue::Number(v)) => actual <= *v,
            (Comparison::Greater, FilterValue::Number(v)) => actual > *v,
            (Comparison::GreaterOrEqual, FilterValue::Number(v)) => actual >= *v,
            _ => false,
        }
    }

    fn flag(&self, actual: bool) -> bool {
        matches!(self.value, FilterValue::Bool(expected) if expected == actual)
    }
}

impl Display for FilterExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.optional {
            f.write_str("~")?;
        }
        if self.inverted {
            f.write_str("-")?;
        }
        if self.field != FilterField::Tag {
            let prefix = FIELD_PREFIXES
                .iter()
                .rev()
                .find(|(_, field)| *field == self.field)
                .map_or("", |(prefix, _)| prefix);
            f.write_str(prefix)?;
        }
        write!(f, "{}{}", self.comparison.symbol(), self.raw_value)
    }
}

fn split_comparison(rest: &str) -> (Comparison, &str) {
    if rest.contains(RANGE_SEPARATOR) {
        return (Comparison::Range, rest);
    }

    OPERATORS
        .iter()
        .find_map(|(op, comparison)| rest.strip_prefix(op).map(|v| (*comparison, v)))
        .unwrap_or((Comparison::Equals, rest))
}

fn parse_value(field: FilterField, comparison: Comparison, literal: &str) -> FilterValue {
    match field {
        FilterField::Tag => FilterValue::Tag(tag_matcher(literal)),
        FilterField::Rating => match Rating::from_rating_str(literal) {
            Rating::Unknown => FilterValue::Discarded,
            rating => FilterValue::Rating(rating),
        },
        FilterField::FileType => match Extension::guess_format(literal) {
            Extension::Unknown => FilterValue::Discarded,
            ext => FilterValue::FileType(ext),
        },
        FilterField::Status => FilterValue::Text(literal.to_string()),
        f if f.is_boolean() => parse_bool(literal).map_or(FilterValue::Discarded, FilterValue::Bool),
        FilterField::Approver if matches!(literal, "none" | "any") => {
            FilterValue::Text(literal.to_string())
        }
        _ => {
            let number = |s: &str| match field {
                FilterField::FileSize => parse_size(s),
                FilterField::AspectRatio => parse_ratio(s),
                _ => parse_number(s),
            };

            let parsed = if comparison == Comparison::Range {
                parse_range(literal, number)
            } else {
                number(literal).map(FilterValue::Number)
            };

            match (parsed, field) {
                (Some(value), _) => value,
                (None, FilterField::Uploader) => FilterValue::Text(literal.to_string()),
                (None, _) => FilterValue::Discarded,
            }
        }
    }
}

fn tag_matcher(literal: &str) -> TagMatcher {
    if !literal.contains('*') {
        return TagMatcher::Exact(literal.to_string());
    }

    let pattern = format!("^{}$", regex::escape(literal).replace(r"\*", r"\S*"));
    match Regex::new(&pattern) {
        Ok(re) => TagMatcher::Wildcard(re),
        Err(_) => TagMatcher::Exact(literal.to_string()),
    }
}

fn parse_bool(literal: &str) -> Option<bool> {
    match literal {
        "true" | "yes" => Some(true),
        "false" | "no" => Some(false),
        _ => None,
    }
}

fn parse_number(literal: &str) -> Option<f64> {
    literal.trim().parse::<f64>().ok().filter(|n| !n.is_nan())
}

/// Converts sizes like `5mb` or `1.5gb` to bytes. Units are binary multiples.
fn parse_size(literal: &str) -> Option<f64> {
    let literal = literal.trim();
    let units = [
        ("gb", 1024_f64.powi(3)),
        ("mb", 1024_f64.powi(2)),
        ("kb", 1024.0),
        ("b", 1.0),
    ];
    let (digits, multiplier) = units
        .iter()
        .find_map(|(unit, mult)| literal.strip_suffix(unit).map(|d| (d, *mult)))
        .unwrap_or((literal, 1.0));

    parse_number(digits).map(|n| (n * multiplier).round())
}

/// Accepts both `1.77` and `16:9`.
fn parse_ratio(literal: &str) -> Option<f64> {
    match literal.split_once(':') {
        Some((w, h)) => {
            let (w, h) = (parse_number(w)?, parse_number(h)?);
            (h != 0.0).then(|| ((w / h) * 100.0).round() / 100.0)
        }
        None => parse_number(literal),
    }
}

fn parse_range(literal: &str, number: impl Fn(&str) -> Option<f64>) -> Option<FilterValue> {
    let parts: Vec<&str> = literal.split(RANGE_SEPARATOR).collect();
    let [a, b] = parts.as_slice() else {
        return None;
    };

    let (a, b) = (number(a)?, number(b)?);
    Some(FilterValue::Range(a.min(b), a.max(b)))
}
