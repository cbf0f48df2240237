use std::io::{self, IsTerminal};

use shodanx::api::{Client, Dispatched};

use crate::config::{Config, Endpoint};
use crate::utils::errors::error_chain;
use crate::{die, RequestedColorMode};

pub(crate) mod output;
pub(crate) mod rest;
pub(crate) mod stream;
mod table;

#[derive(Clone, Copy, strum_macros::Display)]
pub(crate) enum ColorMode {
    On,
    Off,
}

impl ColorMode {
    /// Returns whether ANSI color should be used
    /// If the user has specified a preference, this is honored. This preference
    /// can be specified through the command line or the "NO_COLOR" environment
    /// variable. If the user hasn't stated a preference, color is enabled if
    /// diagnostics go to a terminal.
    pub(crate) fn resolve_auto(cm: RequestedColorMode) -> ColorMode {
        match cm {
            RequestedColorMode::Auto => {
                let disable_color =
                    std::env::var_os("NO_COLOR").is_some() || !io::stderr().is_terminal();

                if disable_color {
                    ColorMode::Off
                } else {
                    ColorMode::On
                }
            }
            RequestedColorMode::On => ColorMode::On,
            RequestedColorMode::Off => ColorMode::Off,
        }
    }
}

pub(crate) fn client_for(config: &Config, endpoint: Endpoint) -> Client {
    let builder = match config.client_builder(endpoint) {
        Ok(builder) => builder,
        Err(err) => die!("{}", error_chain(&err)),
    };

    match builder.build() {
        Ok(client) => client,
        Err(err) => die!("failed to create {:?} client: {}", endpoint, error_chain(&err)),
    }
}

/// The result of a call made outside of any runtime.
pub(crate) fn finish<T>(dispatched: Dispatched<T>) -> T {
    match dispatched.try_complete() {
        Ok(Ok(value)) => value,
        Ok(Err(err)) => die!("{}", error_chain(&err)),
        Err(_) => die!("request did not run to completion"),
    }
}
