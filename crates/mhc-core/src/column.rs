//! Keyword-based column resolution.
//!
//! Exports drift between fiscal years and vendors ("Charge Date",
//! "CHARGE DATE", "Date of Charge"), so sources never address a column by its
//! literal header. Each source instead declares an ordered list of
//! [`ColumnRule`]s; a rule's matchers are tried in order and the first header
//! that qualifies wins.

// ─── Resolution ──────────────────────────────────────────────────────────────

/// Outcome of resolving a column against a header set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'h> {
  Found(&'h str),
  NotFound,
}

impl<'h> Resolution<'h> {
  pub fn found(self) -> Option<&'h str> {
    match self {
      Resolution::Found(h) => Some(h),
      Resolution::NotFound => None,
    }
  }
}

/// Find the first header (in declaration order) matching any keyword.
///
/// Matching is case-insensitive. With `exact`, the header must equal a
/// keyword; otherwise it must contain one.
pub fn find_column<'h, S>(
  headers:  impl IntoIterator<Item = &'h S>,
  keywords: &[&str],
  exact:    bool,
) -> Resolution<'h>
where
  S: AsRef<str> + ?Sized + 'h,
{
  let keywords: Vec<String> = keywords.iter().map(|k| k.to_uppercase()).collect();
  headers
    .into_iter()
    .map(S::as_ref)
    .find(|header| {
      let upper = header.to_uppercase();
      keywords.iter().any(|k| if exact { upper == *k } else { upper.contains(k.as_str()) })
    })
    .map_or(Resolution::NotFound, Resolution::Found)
}

// ─── Rules ───────────────────────────────────────────────────────────────────

/// One pass over the headers.
#[derive(Debug, Clone, Copy)]
pub enum Matcher {
  /// Header equals one of the keywords.
  Exact(&'static [&'static str]),
  /// Header contains one of the keywords.
  Contains(&'static [&'static str]),
  /// Header contains every `all` term and none of the `none` terms.
  AllOf {
    all:  &'static [&'static str],
    none: &'static [&'static str],
  },
}

impl Matcher {
  fn find<'h, S>(&self, headers: impl IntoIterator<Item = &'h S>) -> Resolution<'h>
  where
    S: AsRef<str> + ?Sized + 'h,
  {
    match *self {
      Matcher::Exact(keys) => find_column(headers, keys, true),
      Matcher::Contains(keys) => find_column(headers, keys, false),
      Matcher::AllOf { all, none } => headers
        .into_iter()
        .map(S::as_ref)
        .find(|header| {
          let upper = header.to_uppercase();
          let has = |k: &&str| upper.contains(&k.to_uppercase());
          all.iter().all(has) && !none.iter().any(has)
        })
        .map_or(Resolution::NotFound, Resolution::Found),
    }
  }
}

/// A labelled, ordered list of matchers for one semantic column.
#[derive(Debug, Clone, Copy)]
pub struct ColumnRule {
  pub label:    &'static str,
  pub matchers: &'static [Matcher],
}

impl ColumnRule {
  pub const fn new(label: &'static str, matchers: &'static [Matcher]) -> Self {
    Self { label, matchers }
  }

  pub fn resolve<'h, S: AsRef<str>>(&self, headers: &'h [S]) -> Resolution<'h> {
    self.resolve_excluding(headers, &[])
  }

  /// Resolve while skipping headers already claimed by another rule.
  pub fn resolve_excluding<'h, S: AsRef<str>>(
    &self,
    headers: &'h [S],
    taken:   &[&str],
  ) -> Resolution<'h> {
    for matcher in self.matchers {
      let open = headers.iter().filter(|h| !taken.contains(&(*h).as_ref()));
      if let hit @ Resolution::Found(_) = matcher.find(open) {
        return hit;
      }
    }
    Resolution::NotFound
  }
}
