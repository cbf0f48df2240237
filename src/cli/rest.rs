use serde_json::Value;
use shodanx::api::{ExploitsApi, Facets, Params, Query, RestApi};

use super::output::{
    format_output, print_json, ExploitListing, PortListing, ProtocolListing, SearchListing,
};
use super::{client_for, finish};
use crate::config::{Config, Endpoint};
use crate::{CountArgs, ExploitsArgs, FormatArgs, GetArgs, HostArgs, SearchArgs};

/// Parses a `name=value` argument.
pub(crate) fn parse_param(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected name=value, got \"{}\"", arg)),
    }
}

fn rest_api(config: &Config) -> RestApi {
    RestApi::from_client(client_for(config, Endpoint::Rest))
}

fn query_of(words: &[String]) -> Query {
    Query::new(words.join(" "))
}

pub(crate) fn info_cmd(config: &Config) {
    print_json(&finish(rest_api(config).info()));
}

pub(crate) fn host_cmd(config: &Config, args: &HostArgs) {
    let params = Params::new()
        .with_opt("history", args.history.then_some(true))
        .with_opt("minify", args.minify.then_some(true));

    print_json(&finish(rest_api(config).host(&args.ip, params)));
}

pub(crate) fn search_cmd(config: &Config, args: &SearchArgs) {
    let facets: Facets = args.facets.iter().collect();
    let params = Params::new().with_opt("page", args.page);

    let res = finish(rest_api(config).host_search(&query_of(&args.query), &facets, params));

    format_output(SearchListing::from(&res), args.output.format);
}

pub(crate) fn count_cmd(config: &Config, args: &CountArgs) {
    let facets: Facets = args.facets.iter().collect();

    print_json(&finish(rest_api(config).host_count(&query_of(&args.query), &facets)));
}

pub(crate) fn myip_cmd(config: &Config) {
    match finish(rest_api(config).my_ip()) {
        Value::String(ip) => println!("{}", ip),
        other => print_json(&other),
    }
}

pub(crate) fn ports_cmd(config: &Config, args: &FormatArgs) {
    let res = finish(rest_api(config).ports());

    format_output(PortListing::from(&res), args.format);
}

pub(crate) fn protocols_cmd(config: &Config, args: &FormatArgs) {
    let res = finish(rest_api(config).protocols());

    format_output(ProtocolListing::from(&res), args.format);
}

pub(crate) fn exploits_cmd(config: &Config, args: &ExploitsArgs) {
    let api = ExploitsApi::from_client(client_for(config, Endpoint::Exploits));

    let facets: Facets = args.facets.iter().collect();
    let params = Params::new().with_opt("page", args.page);

    let res = finish(api.search(&query_of(&args.query), &facets, params));

    format_output(ExploitListing::from(&res), args.output.format);
}

pub(crate) fn get_cmd(config: &Config, args: &GetArgs) {
    let client = client_for(config, Endpoint::Rest);

    let params: Params = args.params.iter().cloned().collect();

    let dispatched = if args.post {
        client.post(&args.path, Some(params), Params::new())
    } else {
        client.get(&args.path, params)
    };

    print_json(&finish(dispatched));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_param() {
        assert_eq!(
            parse_param("query=port:22 country:NL"),
            Ok(("query".to_string(), "port:22 country:NL".to_string()))
        );
        assert_eq!(parse_param("minify="), Ok(("minify".to_string(), String::new())));
        assert!(parse_param("=x").is_err());
        assert!(parse_param("novalue").is_err());
    }

    #[test]
    fn test_query_words_are_joined() {
        let words = vec!["apache".to_string(), "country:DE".to_string()];
        assert_eq!(query_of(&words).to_string(), "apache country:DE");
    }
}
