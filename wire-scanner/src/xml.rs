//! Protocol XML parsing: `<protocol>` documents into the
//! [`Protocol`]/[`Interface`]/[`Message`]/[`Arg`] intermediate representation
//! consumed by [`crate::codegen`].

use std::fmt;
use std::io::Read;

use xml::attribute::OwnedAttribute;
use xml::reader::{EventReader, ParserConfig, XmlEvent};

#[derive(Debug)]
pub enum XmlError {
    UnexpectedEof,
    UnexpectedTag { expected: &'static str, found: String },
    MissingAttribute { tag: &'static str, attr: &'static str },
    BadType(String),
    Reader(xml::reader::Error),
}

impl fmt::Display for XmlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XmlError::UnexpectedEof => write!(f, "protocol file ended unexpectedly"),
            XmlError::UnexpectedTag { expected, found } => {
                write!(f, "expected `<{expected}>`, found `<{found}>`")
            }
            XmlError::MissingAttribute { tag, attr } => {
                write!(f, "`<{tag}>` is missing required attribute `{attr}`")
            }
            XmlError::BadType(t) => write!(f, "unknown argument type `{t}`"),
            XmlError::Reader(e) => write!(f, "xml error: {e}"),
        }
    }
}

impl std::error::Error for XmlError {}

impl From<xml::reader::Error> for XmlError {
    fn from(e: xml::reader::Error) -> Self {
        XmlError::Reader(e)
    }
}

pub type Result<T> = std::result::Result<T, XmlError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Int,
    Uint,
    Fixed,
    String,
    Object,
    NewId,
    Array,
    Fd,
    Destructor,
}

fn parse_type(txt: &str) -> Result<Type> {
    Ok(match txt {
        "int" => Type::Int,
        "uint" => Type::Uint,
        "fixed" => Type::Fixed,
        "string" => Type::String,
        "object" => Type::Object,
        "new_id" => Type::NewId,
        "array" => Type::Array,
        "fd" => Type::Fd,
        "destructor" => Type::Destructor,
        other => return Err(XmlError::BadType(other.to_owned())),
    })
}

#[derive(Debug, Clone)]
pub struct Arg {
    pub name: String,
    pub typ: Type,
    pub interface: Option<String>,
    pub allow_null: bool,
    pub enum_: Option<String>,
    pub summary: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct Message {
    pub name: String,
    pub typ: Option<Type>,
    pub since: u32,
    pub args: Vec<Arg>,
    pub summary: Option<String>,
}

impl Message {
    fn new() -> Self {
        Message {
            since: 1,
            ..Default::default()
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct Entry {
    pub name: String,
    pub value: String,
    pub since: u32,
    pub summary: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct Enum {
    pub name: String,
    pub since: u32,
    pub bitfield: bool,
    pub entries: Vec<Entry>,
}

impl Enum {
    fn new() -> Self {
        Enum {
            since: 1,
            ..Default::default()
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct Interface {
    pub name: String,
    pub version: u32,
    pub requests: Vec<Message>,
    pub events: Vec<Message>,
    pub enums: Vec<Enum>,
    pub summary: Option<String>,
}

impl Interface {
    fn new() -> Self {
        Interface {
            version: 1,
            ..Default::default()
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct Protocol {
    pub name: String,
    pub copyright: Option<String>,
    pub interfaces: Vec<Interface>,
}

struct Parser<S: Read> {
    iter: xml::reader::Events<S>,
}

fn attr<'a>(attrs: &'a [OwnedAttribute], name: &str) -> Option<&'a str> {
    attrs.iter().find(|a| a.name.local_name == name).map(|a| a.value.as_str())
}

impl<S: Read> Parser<S> {
    fn next_start(&mut self) -> Result<Option<(String, Vec<OwnedAttribute>)>> {
        loop {
            match self.iter.next() {
                Some(Ok(XmlEvent::StartElement { name, attributes, .. })) => {
                    return Ok(Some((name.local_name, attributes)))
                }
                Some(Ok(XmlEvent::EndElement { .. })) => return Ok(None),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
                None => return Err(XmlError::UnexpectedEof),
            }
        }
    }

    fn skip_unknown_element(&mut self) -> Result<()> {
        let mut depth = 1;
        while depth > 0 {
            match self.iter.next() {
                Some(Ok(XmlEvent::StartElement { .. })) => depth += 1,
                Some(Ok(XmlEvent::EndElement { .. })) => depth -= 1,
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => return Err(XmlError::UnexpectedEof),
            }
        }
        Ok(())
    }

    fn parse_protocol(&mut self) -> Result<Protocol> {
        let (tag, attrs) = self
            .next_start()?
            .ok_or(XmlError::UnexpectedEof)?;
        if tag != "protocol" {
            return Err(XmlError::UnexpectedTag {
                expected: "protocol",
                found: tag,
            });
        }
        let name = attr(&attrs, "name")
            .ok_or(XmlError::MissingAttribute {
                tag: "protocol",
                attr: "name",
            })?
            .to_owned();

        let mut protocol = Protocol {
            name,
            ..Default::default()
        };

        while let Some((tag, attrs)) = self.next_start()? {
            match tag.as_str() {
                "interface" => protocol.interfaces.push(self.parse_interface(&attrs)?),
                "copyright" => {
                    protocol.copyright = Some(self.parse_text_element()?);
                }
                _ => self.skip_unknown_element()?,
            }
        }

        Ok(protocol)
    }

    fn parse_text_element(&mut self) -> Result<String> {
        let mut text = String::new();
        loop {
            match self.iter.next() {
                Some(Ok(XmlEvent::Characters(s))) => text.push_str(&s),
                Some(Ok(XmlEvent::EndElement { .. })) => return Ok(text),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
                None => return Err(XmlError::UnexpectedEof),
            }
        }
    }

    fn parse_interface(&mut self, attrs: &[OwnedAttribute]) -> Result<Interface> {
        let mut interface = Interface::new();
        interface.name = attr(attrs, "name")
            .ok_or(XmlError::MissingAttribute {
                tag: "interface",
                attr: "name",
            })?
            .to_owned();
        if let Some(v) = attr(attrs, "version") {
            interface.version = v.parse().unwrap_or(1);
        }

        while let Some((tag, attrs)) = self.next_start()? {
            match tag.as_str() {
                "request" => interface.requests.push(self.parse_message(&attrs)?),
                "event" => interface.events.push(self.parse_message(&attrs)?),
                "enum" => interface.enums.push(self.parse_enum(&attrs)?),
                "description" => {
                    interface.summary = attr(&attrs, "summary").map(str::to_owned);
                    self.skip_unknown_element()?;
                }
                _ => self.skip_unknown_element()?,
            }
        }
        Ok(interface)
    }

    fn parse_message(&mut self, attrs: &[OwnedAttribute]) -> Result<Message> {
        let mut msg = Message::new();
        msg.name = attr(attrs, "name")
            .ok_or(XmlError::MissingAttribute {
                tag: "request/event",
                attr: "name",
            })?
            .to_owned();
        if let Some(t) = attr(attrs, "type") {
            msg.typ = Some(parse_type(t)?);
        }
        if let Some(s) = attr(attrs, "since") {
            msg.since = s.parse().unwrap_or(1);
        }

        while let Some((tag, attrs)) = self.next_start()? {
            match tag.as_str() {
                "arg" => msg.args.push(self.parse_arg(&attrs)?),
                "description" => {
                    msg.summary = attr(&attrs, "summary").map(str::to_owned);
                    self.skip_unknown_element()?;
                }
                _ => self.skip_unknown_element()?,
            }
        }
        Ok(msg)
    }

    fn parse_arg(&mut self, attrs: &[OwnedAttribute]) -> Result<Arg> {
        let name = attr(attrs, "name")
            .ok_or(XmlError::MissingAttribute {
                tag: "arg",
                attr: "name",
            })?
            .to_owned();
        let typ = parse_type(attr(attrs, "type").ok_or(XmlError::MissingAttribute {
            tag: "arg",
            attr: "type",
        })?)?;
        let interface = attr(attrs, "interface").map(str::to_owned);
        let allow_null = attr(attrs, "allow-null") == Some("true");
        let enum_ = attr(attrs, "enum").map(str::to_owned);
        let summary = attr(attrs, "summary").map(str::to_owned);

        // `<arg>` elements may still carry a nested `<description>`.
        while let Some((tag, _attrs)) = self.next_start()? {
            match tag.as_str() {
                "description" => self.skip_unknown_element()?,
                _ => self.skip_unknown_element()?,
            }
        }

        Ok(Arg {
            name,
            typ,
            interface,
            allow_null,
            enum_,
            summary,
        })
    }

    fn parse_enum(&mut self, attrs: &[OwnedAttribute]) -> Result<Enum> {
        let mut e = Enum::new();
        e.name = attr(attrs, "name")
            .ok_or(XmlError::MissingAttribute {
                tag: "enum",
                attr: "name",
            })?
            .to_owned();
        if let Some(s) = attr(attrs, "since") {
            e.since = s.parse().unwrap_or(1);
        }
        e.bitfield = attr(attrs, "bitfield") == Some("true");

        while let Some((tag, attrs)) = self.next_start()? {
            match tag.as_str() {
                "entry" => e.entries.push(self.parse_entry(&attrs)?),
                "description" => self.skip_unknown_element()?,
                _ => self.skip_unknown_element()?,
            }
        }
        Ok(e)
    }

    fn parse_entry(&mut self, attrs: &[OwnedAttribute]) -> Result<Entry> {
        let name = attr(attrs, "name")
            .ok_or(XmlError::MissingAttribute {
                tag: "entry",
                attr: "name",
            })?
            .to_owned();
        let value = attr(attrs, "value")
            .ok_or(XmlError::MissingAttribute {
                tag: "entry",
                attr: "value",
            })?
            .to_owned();
        let since = attr(attrs, "since").and_then(|s| s.parse().ok()).unwrap_or(1);
        let summary = attr(attrs, "summary").map(str::to_owned);

        while let Some((tag, _)) = self.next_start()? {
            let _ = tag;
            self.skip_unknown_element()?;
        }

        Ok(Entry {
            name,
            value,
            since,
            summary,
        })
    }
}

/// Parse a `<protocol>` document from any `Read` source (a file or stdin).
pub fn parse_stream<S: Read>(stream: S) -> Result<Protocol> {
    let reader = EventReader::new_with_config(stream, ParserConfig::new().trim_whitespace(true));
    let mut parser = Parser {
        iter: reader.into_iter(),
    };
    let mut protocol = parser.parse_protocol()?;

    // `wl_callback.done` is, in every shipped protocol, semantically a
    // destructor event even though the XML schema has no way to say so
    // directly; this lets the generator treat it like any other
    // object-destroying message.
    if protocol.name == "wayland" {
        for interface in &mut protocol.interfaces {
            if interface.name == "wl_callback" {
                if let Some(done) = interface.events.first_mut() {
                    done.typ = Some(Type::Destructor);
                }
            }
        }
    }

    Ok(protocol)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        <protocol name="wayland">
          <interface name="wl_display" version="1">
            <request name="sync" since="1">
              <arg name="callback" type="new_id" interface="wl_callback"/>
            </request>
            <event name="error" since="1">
              <arg name="object_id" type="object"/>
              <arg name="code" type="uint"/>
              <arg name="message" type="string"/>
            </event>
          </interface>
          <interface name="wl_callback" version="1">
            <event name="done" since="1">
              <arg name="callback_data" type="uint"/>
            </event>
          </interface>
        </protocol>
    "#;

    #[test]
    fn parses_interfaces_requests_and_events() {
        let p = parse_stream(SAMPLE.as_bytes()).unwrap();
        assert_eq!(p.name, "wayland");
        assert_eq!(p.interfaces.len(), 2);
        let display = &p.interfaces[0];
        assert_eq!(display.name, "wl_display");
        assert_eq!(display.requests.len(), 1);
        assert_eq!(display.requests[0].name, "sync");
        assert_eq!(display.requests[0].args[0].interface.as_deref(), Some("wl_callback"));
        assert_eq!(display.events[0].args.len(), 3);
    }

    #[test]
    fn wl_callback_done_is_marked_destructor() {
        let p = parse_stream(SAMPLE.as_bytes()).unwrap();
        let callback = p.interfaces.iter().find(|i| i.name == "wl_callback").unwrap();
        assert_eq!(callback.events[0].typ, Some(Type::Destructor));
    }

    #[test]
    fn missing_name_attribute_is_an_error() {
        let bad = r#"<protocol><interface version="1"></interface></protocol>"#;
        assert!(parse_stream(bad.as_bytes()).is_err());
    }
}
