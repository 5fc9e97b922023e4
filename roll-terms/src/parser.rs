/*
Copyright 2021 Robin Marchart

   Licensed under the Apache License, Version 2.0 (the "License");
   you may not use this file except in compliance with the License.
   You may obtain a copy of the License at

       http://www.apache.org/licenses/LICENSE-2.0

   Unless required by applicable law or agreed to in writing, software
   distributed under the License is distributed on an "AS IS" BASIS,
   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
   See the License for the specific language governing permissions and
   limitations under the License.
*/

use crate::{
    error::ParseError,
    options::MainDieSpec,
    term::{DiceTerm, NumericTerm, Operator, Term, TermSequence},
};

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, tag_no_case},
    character::complete::{digit0, digit1, multispace0, satisfy},
    combinator::{all_consuming, map, map_res, opt, recognize, success, verify},
    error::context,
    multi::{many0, many1},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

pub fn parse_u32(input: &str) -> IResult<&str, u32> {
    context(
        "Failed to parse integer between 1 and 4294967295 inclusive",
        verify(
            map_res(digit1, |s: &str| s.parse::<u32>()),
            |value: &u32| value > &0,
        ),
    )(input)
}

pub fn parse_operator(input: &str) -> IResult<&str, Operator> {
    alt((
        map(tag("+"), |_| Operator::Add),
        map(tag("-"), |_| Operator::Sub),
        map(tag("*"), |_| Operator::Mul),
        map(tag("/"), |_| Operator::Div),
    ))(input)
}

pub fn parse_faces(input: &str) -> IResult<&str, u32> {
    alt((parse_u32, map(tag("%"), |_| 100)))(input)
}

/// Keep-highest/keep-lowest dice modifier, normalized to lowercase.
pub fn parse_modifier(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(
            alt((tag_no_case("kh"), tag_no_case("kl"))),
            digit0,
        )),
        |s: &str| s.to_ascii_lowercase(),
    )(input)
}

/// Bracketed flavor annotation, e.g. the "Crit" of `12[Crit]`.
pub fn parse_flavor(input: &str) -> IResult<&str, String> {
    map(delimited(tag("["), is_not("]"), tag("]")), |s: &str| {
        s.to_string()
    })(input)
}

pub fn parse_dice_term(input: &str) -> IResult<&str, DiceTerm> {
    map(
        tuple((
            alt((parse_u32, success(1))),
            preceded(tag_no_case("d"), parse_faces),
            many0(parse_modifier),
            opt(parse_flavor),
        )),
        |(count, faces, modifiers, flavor)| {
            let mut dice = DiceTerm::new(count, faces);
            dice.modifiers = modifiers;
            dice.options.flavor = flavor;
            dice
        },
    )(input)
}

pub fn parse_numeric(input: &str) -> IResult<&str, NumericTerm> {
    map(
        pair(map_res(digit1, |s: &str| s.parse::<i64>()), opt(parse_flavor)),
        |(value, flavor)| {
            let mut num = NumericTerm::new(value);
            num.options.flavor = flavor;
            num
        },
    )(input)
}

pub fn parse_placeholder(input: &str) -> IResult<&str, NumericTerm> {
    map(
        preceded(
            tag("@"),
            recognize(many1(satisfy(|c: char| {
                c.is_ascii_alphanumeric() || c == '_'
            }))),
        ),
        |name: &str| NumericTerm::placeholder(name),
    )(input)
}

pub fn parse_term(input: &str) -> IResult<&str, Term> {
    alt((
        map(parse_dice_term, Term::Dice),
        map(parse_placeholder, Term::Numeric),
        map(parse_numeric, Term::Numeric),
        map(parse_operator, Term::Operator),
    ))(input)
}

pub fn parse_terms(input: &str) -> IResult<&str, Vec<Term>> {
    many1(preceded(multispace0, parse_term))(input)
}

/// Parse a complete formula into a term sequence.
pub fn parse_formula(input: &str) -> Result<TermSequence, ParseError> {
    match all_consuming(terminated(parse_terms, multispace0))(input) {
        Ok((_, terms)) => Ok(TermSequence::from_terms(terms)),
        Err(_) => Err(ParseError::new(input)),
    }
}

/// Parse a bare main-die specifier such as "1d20" or "2d10".
pub fn parse_main_die(input: &str) -> Result<MainDieSpec, ParseError> {
    let die = all_consuming(terminated(
        preceded(multispace0, parse_dice_term),
        multispace0,
    ))(input)
    .map_err(|_| ParseError::new(input))?
    .1;
    if !die.modifiers.is_empty() || die.options.flavor.is_some() {
        return Err(ParseError::new(input));
    }
    Ok(MainDieSpec {
        count: die.count,
        faces: die.faces,
    })
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_parse_u32() {
        assert_eq!(parse_u32("1"), Ok(("", 1)));
        assert_eq!(parse_u32("6969"), Ok(("", 6969)));
        assert!(parse_u32("0").is_err());
        assert!(parse_u32("").is_err());
        assert!(parse_u32("-1").is_err());
    }

    #[test]
    fn test_parse_operator() {
        assert_eq!(parse_operator("+"), Ok(("", Operator::Add)));
        assert_eq!(parse_operator("-"), Ok(("", Operator::Sub)));
        assert_eq!(parse_operator("*"), Ok(("", Operator::Mul)));
        assert_eq!(parse_operator("/"), Ok(("", Operator::Div)));
        assert!(parse_operator("x").is_err());
    }

    #[test]
    fn test_parse_modifier() {
        assert_eq!(parse_modifier("kh1"), Ok(("", "kh1".to_string())));
        assert_eq!(parse_modifier("KL2"), Ok(("", "kl2".to_string())));
        assert_eq!(parse_modifier("kh"), Ok(("", "kh".to_string())));
        assert!(parse_modifier("rr1").is_err());
    }

    #[test]
    fn test_parse_dice_term() {
        assert_eq!(parse_dice_term("1d20"), Ok(("", DiceTerm::new(1, 20))));
        assert_eq!(parse_dice_term("d6"), Ok(("", DiceTerm::new(1, 6))));
        assert_eq!(parse_dice_term("d%"), Ok(("", DiceTerm::new(1, 100))));
        let expected = {
            let mut d = DiceTerm::new(2, 20);
            d.modifiers.push("kh1".to_string());
            d
        };
        assert_eq!(parse_dice_term("2d20kh1"), Ok(("", expected)));
        assert!(parse_dice_term("d0").is_err());
        assert!(parse_dice_term("20").is_err());
    }

    #[test]
    fn test_parse_placeholder() {
        assert_eq!(
            parse_placeholder("@str"),
            Ok(("", NumericTerm::placeholder("str")))
        );
        assert_eq!(
            parse_placeholder("@mod_2 + 1"),
            Ok((" + 1", NumericTerm::placeholder("mod_2")))
        );
        assert!(parse_placeholder("str").is_err());
    }

    #[test]
    fn test_parse_flavor() {
        assert_eq!(
            parse_numeric("12[Crit]"),
            Ok(("", NumericTerm::flavored(12, "Crit")))
        );
        let (rest, die) = parse_dice_term("2d6[fire]").unwrap();
        assert_eq!(rest, "");
        assert_eq!(die.options.flavor.as_deref(), Some("fire"));
    }

    #[test]
    fn test_parse_formula() {
        let seq = parse_formula("1d20 + 5").unwrap();
        assert_eq!(seq.formula(), "1d20 + 5");
        assert_eq!(seq.terms().len(), 3);

        let seq = parse_formula(" 2d6+1d4 -2 ").unwrap();
        assert_eq!(seq.formula(), "2d6 + 1d4 - 2");

        let seq = parse_formula("1d8 + @str").unwrap();
        assert_eq!(seq.unresolved_placeholders(), vec!["str".to_string()]);

        assert!(parse_formula("").is_err());
        assert!(parse_formula("1d20 + bogus").is_err());
    }

    #[test]
    fn test_parse_main_die() {
        assert_eq!(
            parse_main_die("1d20"),
            Ok(MainDieSpec {
                count: 1,
                faces: 20
            })
        );
        assert_eq!(
            parse_main_die("2d10"),
            Ok(MainDieSpec {
                count: 2,
                faces: 10
            })
        );
        assert!(parse_main_die("2d10kh1").is_err());
        assert!(parse_main_die("10").is_err());
    }
}
