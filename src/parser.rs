use nom::{
    branch::alt,
    bytes::complete::{is_a, tag},
    character::{
        complete::{digit1, space1},
        is_digit,
    },
    combinator::{map, map_res, value, verify},
    sequence::tuple,
    IResult,
};

use crate::{
    ast::{Command::*, Segment::*, *},
    error::ParseError,
};

fn integer(input: &str) -> IResult<&str, u16> {
    map_res(digit1, |c: &str| c.parse())(input)
}

fn segment(input: &str) -> IResult<&str, Segment> {
    alt((
        value(Constant, tag("constant")),
        value(Local, tag("local")),
        value(Static, tag("static")),
        value(Argument, tag("argument")),
        value(This, tag("this")),
        value(That, tag("that")),
        value(Pointer, tag("pointer")),
        value(Temp, tag("temp")),
    ))(input)
}

fn push(input: &str) -> IResult<&str, Command> {
    map(
        tuple((tag("push"), space1, segment, space1, integer)),
        |(_, _, segment, _, arg)| Push(segment, arg),
    )(input)
}

#[test]
fn test_push() {
    assert_eq!(push("push  pointer  32"), Ok(("", Push(Pointer, 32))));
}

#[test]
fn test_push_rejects_out_of_range_index() {
    assert!(push("push constant 70000").is_err());
}

fn pop(input: &str) -> IResult<&str, Command> {
    verify(
        map(
            tuple((tag("pop"), space1, segment, space1, integer)),
            |(_, _, segment, _, arg)| Pop(segment, arg),
        ),
        |p| !matches!(p, Pop(Constant, _)),
    )(input)
}

#[test]
fn test_pop() {
    assert_eq!(pop("pop static 8"), Ok(("", Pop(Static, 8))));
    assert!(pop("pop constant 8").is_err());
}

fn prim(input: &str) -> IResult<&str, Command> {
    alt((
        value(Add, tag("add")),
        value(Sub, tag("sub")),
        value(Neg, tag("neg")),
        value(Eq, tag("eq")),
        value(Gt, tag("gt")),
        value(Lt, tag("lt")),
        value(And, tag("and")),
        value(Or, tag("or")),
        value(Not, tag("not")),
    ))(input)
}

#[test]
fn test_prim() {
    assert_eq!(prim("neg"), Ok(("", Neg)));
}

fn symbol(input: &str) -> IResult<&str, String> {
    map(
        verify(
            is_a("abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_.$:0123456789"),
            |c: &str| !is_digit(c.as_bytes()[0]),
        ),
        |sym: &str| sym.to_string(),
    )(input)
}

fn branching(input: &str) -> IResult<&str, Command> {
    alt((
        map(tuple((tag("if-goto"), space1, symbol)), |(_, _, sym)| IfGoto(sym)),
        map(tuple((tag("label"), space1, symbol)), |(_, _, sym)| Label(sym)),
        map(tuple((tag("goto"), space1, symbol)), |(_, _, sym)| Goto(sym)),
    ))(input)
}

#[test]
fn test_branching() {
    assert_eq!(branching("if-goto LOOP_START"), Ok(("", IfGoto("LOOP_START".into()))));
    assert_eq!(branching("label Main.end$1"), Ok(("", Label("Main.end$1".into()))));
    assert!(branching("goto 1abc").is_err());
}

/// Parses VM source text into commands tagged with their 1-based line.
///
/// Comments (`//` to end of line) and blank lines are skipped. The first
/// line that is not a complete command aborts the parse.
pub fn parse(input: &str) -> Result<Vec<Spanned>, ParseError> {
    let mut commands = vec![];

    for (number, line) in input.lines().enumerate() {
        let line = line.split_once("//").map(|(s, _)| s).unwrap_or(line).trim();
        if line.is_empty() {
            continue;
        }

        let res = alt((push, pop, prim, branching))(line);

        match res {
            Ok(("", command)) => commands.push(Spanned {
                line: number + 1,
                command,
            }),
            Ok((remainder, _)) => {
                return Err(ParseError::TrailingInput {
                    line: number + 1,
                    text: line.to_string(),
                    rest: remainder.trim().to_string(),
                })
            }
            Err(_) => {
                return Err(ParseError::InvalidCommand {
                    line: number + 1,
                    text: line.to_string(),
                })
            }
        }
    }

    log::debug!("parsed {} command(s)", commands.len());
    Ok(commands)
}

#[test]
fn test_parse_skips_comments_and_blank_lines() {
    let source = "// StaticTest\n\npush constant 111   // first\n  add\n";
    assert_eq!(
        parse(source),
        Ok(vec![
            Spanned {
                line: 3,
                command: Push(Constant, 111)
            },
            Spanned {
                line: 4,
                command: Add
            },
        ])
    );
}

#[test]
fn test_parse_reports_line_of_bad_command() {
    let err = parse("push constant 1\npop constant 3\n").unwrap_err();
    assert_eq!(
        err,
        ParseError::InvalidCommand {
            line: 2,
            text: "pop constant 3".into()
        }
    );
}

#[test]
fn test_parse_rejects_extra_parts() {
    let err = parse("add 3").unwrap_err();
    assert_eq!(err.line(), 1);
    assert!(matches!(err, ParseError::TrailingInput { rest, .. } if rest == "3"));
}
