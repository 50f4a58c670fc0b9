use pest::iterators::Pair;
use pest::Parser;

#[derive(pest_derive::Parser)]
#[grammar = "rvasm.pest"]
pub struct AsmParser;

pub type ParseError = pest::error::Error<Rule>;

/// Parses one source line of the text segment.
pub(crate) fn parse_line(input: &str) -> Result<Pair<Rule>, ParseError> {
    Ok(AsmParser::parse(Rule::line, input)?.next().unwrap())
}

/// Tokenizes one source line of the data segment.
pub(crate) fn parse_data_line(input: &str) -> Result<Vec<&str>, ParseError> {
    let pair = AsmParser::parse(Rule::data_line, input)?.next().unwrap();
    Ok(pair
        .into_inner()
        .filter(|p| p.as_rule() == Rule::tok)
        .map(|p| p.as_str())
        .collect())
}
