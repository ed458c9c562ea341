use super::{spec_version, text_child, write_document};
use xmltree::{Element, XMLNode};

/// Sens d'un argument d'action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

#[derive(Debug, Clone)]
pub struct ScpdArgument {
    pub name: &'static str,
    pub direction: Direction,
    pub related_state_variable: &'static str,
}

#[derive(Debug, Clone)]
pub struct ScpdAction {
    pub name: &'static str,
    pub arguments: Vec<ScpdArgument>,
}

impl ScpdAction {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            arguments: Vec::new(),
        }
    }

    pub fn input(mut self, name: &'static str, variable: &'static str) -> Self {
        self.arguments.push(ScpdArgument {
            name,
            direction: Direction::In,
            related_state_variable: variable,
        });
        self
    }

    pub fn output(mut self, name: &'static str, variable: &'static str) -> Self {
        self.arguments.push(ScpdArgument {
            name,
            direction: Direction::Out,
            related_state_variable: variable,
        });
        self
    }
}

#[derive(Debug, Clone)]
pub struct StateVariable {
    pub name: &'static str,
    pub data_type: &'static str,
    pub send_events: bool,
    pub allowed_values: Vec<&'static str>,
}

impl StateVariable {
    pub fn new(name: &'static str, data_type: &'static str) -> Self {
        Self {
            name,
            data_type,
            send_events: false,
            allowed_values: Vec::new(),
        }
    }

    pub fn evented(mut self) -> Self {
        self.send_events = true;
        self
    }

    pub fn allowed(mut self, values: &[&'static str]) -> Self {
        self.allowed_values = values.to_vec();
        self
    }
}

/// Service Control Protocol Description
#[derive(Debug, Clone, Default)]
pub struct Scpd {
    pub actions: Vec<ScpdAction>,
    pub state_variables: Vec<StateVariable>,
}

impl Scpd {
    pub fn to_xml(&self) -> Result<String, xmltree::Error> {
        let mut root = Element::new("scpd");
        root.attributes.insert(
            "xmlns".to_string(),
            "urn:schemas-upnp-org:service-1-0".to_string(),
        );
        root.children.push(XMLNode::Element(spec_version()));

        let mut action_list = Element::new("actionList");
        for action in &self.actions {
            let mut elem = Element::new("action");
            text_child(&mut elem, "name", action.name);

            if !action.arguments.is_empty() {
                let mut args = Element::new("argumentList");
                for arg in &action.arguments {
                    let mut a = Element::new("argument");
                    text_child(&mut a, "name", arg.name);
                    let direction = match arg.direction {
                        Direction::In => "in",
                        Direction::Out => "out",
                    };
                    text_child(&mut a, "direction", direction);
                    text_child(&mut a, "relatedStateVariable", arg.related_state_variable);
                    args.children.push(XMLNode::Element(a));
                }
                elem.children.push(XMLNode::Element(args));
            }
            action_list.children.push(XMLNode::Element(elem));
        }
        root.children.push(XMLNode::Element(action_list));

        let mut table = Element::new("serviceStateTable");
        for var in &self.state_variables {
            let mut elem = Element::new("stateVariable");
            elem.attributes.insert(
                "sendEvents".to_string(),
                if var.send_events { "yes" } else { "no" }.to_string(),
            );
            text_child(&mut elem, "name", var.name);
            text_child(&mut elem, "dataType", var.data_type);
            if !var.allowed_values.is_empty() {
                let mut list = Element::new("allowedValueList");
                for value in &var.allowed_values {
                    text_child(&mut list, "allowedValue", value);
                }
                elem.children.push(XMLNode::Element(list));
            }
            table.children.push(XMLNode::Element(elem));
        }
        root.children.push(XMLNode::Element(table));

        write_document(&root)
    }
}
