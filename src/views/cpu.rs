use super::*;

use dashboard::{top, Aggregate, Reducer};
use std::collections::{BTreeMap, HashSet};

const CONTAINER_USAGE: &str = "CPU usage of container <selector>, cores";
const CONTAINER_DELAY: &str = "CPU delay of container <selector>, seconds/second";
const CONTAINER_THROTTLING: &str = "Throttled time of container <selector>, seconds/second";
const NODE_USAGE: &str = "Node CPU usage <selector>, %";
const NODE_CONSUMERS: &str = "CPU consumers on <selector>, cores";

// key of the chart holding every relevant node's total usage
const OVERVIEW: &str = "overview";

const TOP_CONSUMERS: usize = 5;

/// CPU modes in stacking order with their display colors. Modes missing from
/// a node's data are left out of its chart.
static CPU_MODES: &[(&str, &str)] = &[
    ("user", "blue"),
    ("nice", "lightGreen"),
    ("system", "red"),
    ("wait", "orange"),
    ("iowait", "orange"),
    ("steal", "black"),
    ("irq", "grey"),
    ("softirq", "yellow"),
];

pub fn application(world: &World, app: &Application) -> Dashboard {
    let mut dash = Dashboard::new("CPU");
    let mut relevant_nodes: HashSet<&str> = HashSet::new();

    for instance in world.instances_of(app) {
        /*
         * Containers
         */

        for container in instance.containers() {
            dash.get_or_create_chart_in_group(CONTAINER_USAGE, &container.name)
                .add_series(instance.name(), container.cpu_usage.clone())
                .set_threshold("limit", container.cpu_limit.clone(), Reducer::Max);

            dash.get_or_create_chart_in_group(CONTAINER_DELAY, &container.name)
                .add_series(instance.name(), container.cpu_delay.clone());

            dash.get_or_create_chart_in_group(CONTAINER_THROTTLING, &container.name)
                .add_series(instance.name(), container.throttled_time.clone());
        }

        /*
         * Nodes
         */

        let Some(node) = world.node_of(instance) else {
            continue;
        };

        if !relevant_nodes.insert(node.name.as_str()) {
            continue;
        }

        dash.get_or_create_chart_in_group(NODE_USAGE, OVERVIEW)
            .add_series(node.name.as_str(), node.cpu_usage_percent.clone())
            .featured();

        node_charts(&mut dash, world, node);
    }

    dash
}

pub fn node(world: &World, node: &Node) -> Dashboard {
    let mut dash = Dashboard::new("CPU");
    node_charts(&mut dash, world, node);
    dash
}

fn node_charts(dash: &mut Dashboard, world: &World, node: &Node) {
    let by_mode = dash
        .get_or_create_chart_in_group(NODE_USAGE, &node.name)
        .sorted()
        .stacked();

    for (mode, color) in CPU_MODES {
        if let Some(usage) = node.cpu_usage_by_mode.get(*mode) {
            by_mode.add_series_with_color(*mode, *color, usage.clone());
        }
    }

    // usage of every application with containers on this node
    let mut usage_by_app: BTreeMap<&str, Aggregate> = BTreeMap::new();

    for instance in world.instances_on(node) {
        if instance.containers().is_empty() {
            continue;
        }

        let usage = usage_by_app
            .entry(instance.owner().name.as_str())
            .or_insert_with(|| Aggregate::new(Reducer::Sum));

        for container in instance.containers() {
            usage.add_input(container.cpu_usage.clone());
        }
    }

    dash.get_or_create_chart_in_group(NODE_CONSUMERS, &node.name)
        .stacked()
        .sorted()
        .set_threshold("total", node.cpu_capacity.clone(), Reducer::Any)
        .add_many(top(usage_by_app, Reducer::Sum, TOP_CONSUMERS));
}
