//! Canonical literal configuration for the relay.

/// Name the forwarder is published under in the host plugin registry.
pub const PLUGIN_NAME: &str = "BeaconRepeater";

/// Host event the forwarder subscribes to.
pub const BEACON_EVENT: &str = "beacon";

/// Secondary collection endpoint.
pub const DEFAULT_FORWARD_TARGET: &str = "https://www.tiaa.org/public/text/pmt.gif";

/// Beacon fields copied onto the repeated beacon.
pub const DEFAULT_ALLOW_LIST: &[&str] = &[
    // Round-trip timer
    "rt.start",
    "rt.tstart",
    "rt.bstart",
    "rt.end",
    "t_resp",
    "t_page",
    "t_done",
    "r",
    // Navigation timing
    "nt_red_cnt",
    "nt_nav_type",
    "nt_nav_st",
    "nt_red_st",
    "nt_red_end",
    "nt_fet_st",
    "nt_dns_st",
    "nt_dns_end",
    "nt_con_st",
    "nt_con_end",
    "nt_req_st",
    "nt_res_st",
    "nt_res_end",
    "nt_domloading",
    "nt_domint",
    "nt_domcontloaded_st",
    "nt_domcontloaded_end",
    "nt_domcomp",
    "nt_load_st",
    "nt_load_end",
    "nt_unload_st",
    "nt_unload_end",
    "nt_spdy",
    "nt_cinf",
    "nt_first_paint",
    // Page and environment
    "u",
    "v",
    "vis.st",
    "ua.plt",
    "ua.vnd",
];
