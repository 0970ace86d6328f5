//! Comfy App Js 封装库

mod app;
pub use app::ComfyApp;

mod extension;
pub use extension::Extension;

pub mod node;
pub use node::Node;

mod node_type;
pub use node_type::NodeType;

mod widget;
pub use widget::{Widget, WidgetOptions, WidgetValue};

mod node_data;
pub use node_data::NodeData;

mod l_graph_node;
pub use l_graph_node::LGraphNode;
