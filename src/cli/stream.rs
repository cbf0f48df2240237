use serde_json::Value;
use shodanx::api::StreamingApi;
use tracing::debug;

use super::{client_for, finish};
use crate::config::{Config, Endpoint};
use crate::{StreamArgs, StreamSource};

fn print_item(item: Value) {
    println!("{}", item);
}

pub(crate) fn stream_cmd(config: &Config, args: &StreamArgs) {
    let api = StreamingApi::from_client(client_for(config, Endpoint::Stream));

    let dispatched = match &args.source {
        StreamSource::Banners(args) => {
            if !args.ports.is_empty() {
                api.banners_on_ports(args.ports.iter().copied(), args.limit, print_item)
            } else if !args.countries.is_empty() {
                api.banners_within_countries(&args.countries, args.limit, print_item)
            } else if !args.asns.is_empty() {
                api.banners_within_asns(&args.asns, args.limit, print_item)
            } else {
                api.banners(args.limit, print_item)
            }
        }
        StreamSource::Alerts(args) => match &args.id {
            Some(id) => api.alert(id, args.limit, print_item),
            None => api.alerts(args.limit, print_item),
        },
    };

    let delivered = finish(dispatched);

    debug!(delivered, "stream finished");
}
