//! Grammars for single-line keyword headers.
//!
//! TagScript has no grammar for whole documents, but several keywords carry
//! a fixed header shape on their line. Those shapes are parsed here with
//! chumsky; everything around them is line scanning.
//!
//! | Header | Shape |
//! |--------|-------|
//! | `IF` | `IF <condition> THEN ...` |
//! | `FOR EACH` | `FOR EACH <variable> IN <collection> DO ...` |
//! | `CALL API` | `CALL API <target> WITH <payload>` |
//! | `CALL` | `CALL <name>(<args>)` |
//! | `DEFINE FUNCTION` | `DEFINE FUNCTION <name>...` |
//! | `CLASS` | `CLASS <name>...` |
//!
//! Captured segments are lazy: a segment ends at the first place its
//! terminator matches, so `IF a THEN b THEN` has the condition `a`.
//!
//! # Example
//!
//! ```rust
//! use tagscript_parser::headers;
//!
//! assert_eq!(headers::if_condition("IF score > 10 THEN"), Some("score > 10"));
//! assert_eq!(headers::for_each("FOR EACH row IN rows DO"), Some(("row", "rows", "")));
//! assert_eq!(headers::if_condition("IF score > 10"), None);
//! ```

use chumsky::prelude::*;

/// Parser extra state: rich errors over characters.
type Extra<'src> = extra::Err<Rich<'src, char>>;

/// One or more spaces or tabs.
fn gap<'src>() -> impl Parser<'src, &'src str, (), Extra<'src>> + Clone {
    one_of(" \t").repeated().at_least(1).ignored()
}

/// Whitespace followed by a keyword, e.g. the ` THEN` in `IF x THEN`.
fn spaced<'src>(keyword: &'static str) -> impl Parser<'src, &'src str, (), Extra<'src>> + Clone {
    gap().then(just(keyword)).ignored()
}

/// At least one character, stopping before the first match of `stop`.
fn until<'src, S>(stop: S) -> impl Parser<'src, &'src str, &'src str, Extra<'src>> + Clone
where
    S: Parser<'src, &'src str, (), Extra<'src>> + Clone,
{
    any().and_is(stop.not()).repeated().at_least(1).to_slice()
}

/// Anything left on the line.
fn rest<'src>() -> impl Parser<'src, &'src str, (), Extra<'src>> + Clone {
    any().repeated().ignored()
}

/// A declared name: no whitespace, no `(`, `:` or `{`.
fn name<'src>() -> impl Parser<'src, &'src str, &'src str, Extra<'src>> + Clone {
    none_of(" \t(:{").repeated().at_least(1).to_slice()
}

fn if_header<'src>() -> impl Parser<'src, &'src str, &'src str, Extra<'src>> {
    just("IF")
        .ignore_then(gap())
        .ignore_then(until(spaced("THEN")))
        .then_ignore(spaced("THEN"))
        .then_ignore(rest())
}

type ForEachParts<'src> = ((&'src str, &'src str), &'src str);

fn for_each_header<'src>() -> impl Parser<'src, &'src str, ForEachParts<'src>, Extra<'src>> {
    let in_sep = spaced("IN").then(gap()).ignored();

    just("FOR EACH")
        .ignore_then(gap())
        .ignore_then(until(in_sep.clone()))
        .then_ignore(in_sep)
        .then(until(spaced("DO")))
        .then_ignore(spaced("DO"))
        .then(any().repeated().to_slice())
}

fn call_api_header<'src>() -> impl Parser<'src, &'src str, (&'src str, &'src str), Extra<'src>> {
    let with_sep = spaced("WITH").then(gap()).ignored();

    just("CALL API")
        .ignore_then(gap())
        .ignore_then(until(with_sep.clone()))
        .then_ignore(with_sep)
        .then(any().repeated().at_least(1).to_slice())
}

type CallParts<'src> = (&'src str, Option<&'src str>);

fn call_header<'src>() -> impl Parser<'src, &'src str, CallParts<'src>, Extra<'src>> {
    just("CALL")
        .ignore_then(gap())
        .ignore_then(none_of("(").repeated().at_least(1).to_slice())
        .then(just('(').ignore_then(any().repeated().to_slice()).or_not())
}

fn declaration_header<'src>(
    keyword: &'static str,
) -> impl Parser<'src, &'src str, &'src str, Extra<'src>> {
    just(keyword)
        .ignore_then(gap())
        .ignore_then(name())
        .then_ignore(rest())
}

fn call_shape<'src>() -> impl Parser<'src, &'src str, (&'src str, &'src str), Extra<'src>> {
    any()
        .filter(|c: &char| c.is_alphanumeric() || *c == '_')
        .repeated()
        .at_least(1)
        .to_slice()
        .then_ignore(just('('))
        .then(any().repeated().to_slice())
}

/// The condition text of an `IF ... THEN` line.
pub fn if_condition(line: &str) -> Option<&str> {
    if_header().parse(line).into_result().ok().map(str::trim)
}

/// `(variable, collection, body)` of a `FOR EACH ... IN ... DO` line, where
/// `body` is whatever follows `DO` on the same line.
pub fn for_each(line: &str) -> Option<(&str, &str, &str)> {
    for_each_header()
        .parse(line)
        .into_result()
        .ok()
        .map(|((variable, collection), body)| (variable.trim(), collection.trim(), body.trim()))
}

/// `(target, payload)` of a `CALL API ... WITH ...` line.
pub fn call_api(line: &str) -> Option<(&str, &str)> {
    call_api_header()
        .parse(line)
        .into_result()
        .ok()
        .map(|(target, payload)| (target.trim(), payload.trim()))
}

/// `(target, raw args)` of a `CALL name(args)` line. Args end at the last
/// `)`, so trailing text after it is ignored; without any `)` the rest of
/// the line is taken. A call without parentheses has empty args.
pub fn call(line: &str) -> Option<(&str, &str)> {
    let (target, args) = call_header().parse(line).into_result().ok()?;
    let target = target.trim();
    if target.is_empty() {
        return None;
    }
    let args = args.map_or("", |a| match a.rfind(')') {
        Some(close) => a[..close].trim(),
        None => a.trim(),
    });
    Some((target, args))
}

/// The name declared by a `DEFINE FUNCTION` line.
pub fn function_name(line: &str) -> Option<&str> {
    declaration_header("DEFINE FUNCTION").parse(line).into_result().ok()
}

/// The name declared by a `CLASS` line.
pub fn class_name(line: &str) -> Option<&str> {
    declaration_header("CLASS").parse(line).into_result().ok()
}

/// `(name, raw args)` when the whole text has the shape `name(args)`.
pub fn function_call(text: &str) -> Option<(&str, &str)> {
    let (name, tail) = call_shape().parse(text).into_result().ok()?;
    let args = tail.strip_suffix(')')?;
    Some((name, args))
}
