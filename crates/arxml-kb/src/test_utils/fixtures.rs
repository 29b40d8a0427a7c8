//! Small ARXML documents covering the extraction scenarios.

use crate::data::entities::ImportFile;

/// Wraps `name` and `content` in an [`ImportFile`] under `/fixtures`.
pub fn import_file(name: &str, content: &str) -> ImportFile {
    ImportFile::new(name, format!("/fixtures/{}", name), content)
}

/// Package with an interface and a component whose port references it.
/// Three nodes, two containment edges, one resolved reference.
pub const RESOLVED_REFERENCE_ARXML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<AUTOSAR xmlns="http://autosar.org/schema/r4.0">
  <AR-PACKAGES>
    <AR-PACKAGE UUID="pkg-1">
      <SHORT-NAME>Pkg</SHORT-NAME>
      <ELEMENTS>
        <SENDER-RECEIVER-INTERFACE UUID="if-speed">
          <SHORT-NAME>Speed</SHORT-NAME>
          <IS-SERVICE>false</IS-SERVICE>
        </SENDER-RECEIVER-INTERFACE>
        <APPLICATION-SW-COMPONENT-TYPE UUID="comp-1">
          <SHORT-NAME>Comp</SHORT-NAME>
          <PORTS>
            <R-PORT-PROTOTYPE>
              <SHORT-NAME>SpeedIn</SHORT-NAME>
              <REQUIRED-INTERFACE-TREF DEST="SENDER-RECEIVER-INTERFACE">/Pkg/Speed</REQUIRED-INTERFACE-TREF>
            </R-PORT-PROTOTYPE>
          </PORTS>
        </APPLICATION-SW-COMPONENT-TYPE>
      </ELEMENTS>
    </AR-PACKAGE>
  </AR-PACKAGES>
</AUTOSAR>
"#;

/// Component with two ports, the first referencing the second.
/// Three nodes, two containment edges, one resolved reference.
pub const PORT_TO_PORT_ARXML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<AUTOSAR>
  <AR-PACKAGES>
    <AR-PACKAGE>
      <SHORT-NAME>Pkg</SHORT-NAME>
      <ELEMENTS>
        <APPLICATION-SW-COMPONENT-TYPE UUID="comp-1">
          <SHORT-NAME>Comp</SHORT-NAME>
          <PORTS>
            <P-PORT-PROTOTYPE UUID="port-a">
              <SHORT-NAME>PortA</SHORT-NAME>
              <LINKED-PORT-REF DEST="R-PORT-PROTOTYPE">/Pkg/Comp/PortB</LINKED-PORT-REF>
            </P-PORT-PROTOTYPE>
            <R-PORT-PROTOTYPE UUID="port-b">
              <SHORT-NAME>PortB</SHORT-NAME>
            </R-PORT-PROTOTYPE>
          </PORTS>
        </APPLICATION-SW-COMPONENT-TYPE>
      </ELEMENTS>
    </AR-PACKAGE>
  </AR-PACKAGES>
</AUTOSAR>
"#;

/// Two components referencing the same interface that is not defined.
pub const SHARED_UNRESOLVED_ARXML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<AUTOSAR>
  <AR-PACKAGES>
    <AR-PACKAGE UUID="pkg-1">
      <SHORT-NAME>Pkg</SHORT-NAME>
      <ELEMENTS>
        <APPLICATION-SW-COMPONENT-TYPE UUID="comp-a">
          <SHORT-NAME>A</SHORT-NAME>
          <PORTS>
            <R-PORT-PROTOTYPE UUID="port-a">
              <SHORT-NAME>In</SHORT-NAME>
              <REQUIRED-INTERFACE-TREF DEST="SENDER-RECEIVER-INTERFACE">/Lib/Ifs/Missing</REQUIRED-INTERFACE-TREF>
            </R-PORT-PROTOTYPE>
          </PORTS>
        </APPLICATION-SW-COMPONENT-TYPE>
        <APPLICATION-SW-COMPONENT-TYPE UUID="comp-b">
          <SHORT-NAME>B</SHORT-NAME>
          <PORTS>
            <R-PORT-PROTOTYPE UUID="port-b">
              <SHORT-NAME>In</SHORT-NAME>
              <REQUIRED-INTERFACE-TREF DEST="SENDER-RECEIVER-INTERFACE">/Lib/Ifs/Missing</REQUIRED-INTERFACE-TREF>
            </R-PORT-PROTOTYPE>
          </PORTS>
        </APPLICATION-SW-COMPONENT-TYPE>
      </ELEMENTS>
    </AR-PACKAGE>
  </AR-PACKAGES>
</AUTOSAR>
"#;

/// A reference with no node anywhere above it, next to one real node.
pub const ORPHAN_REFERENCE_ARXML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<AUTOSAR>
  <AR-PACKAGES>
    <AR-PACKAGE>
      <SHORT-NAME>Loose</SHORT-NAME>
      <ELEMENTS>
        <DATA-TYPE-MAPPING-SET>
          <SHORT-NAME>Mappings</SHORT-NAME>
          <TYPE-TREF DEST="IMPLEMENTATION-DATA-TYPE">/Types/UInt8</TYPE-TREF>
        </DATA-TYPE-MAPPING-SET>
      </ELEMENTS>
    </AR-PACKAGE>
    <AR-PACKAGE UUID="pkg-types">
      <SHORT-NAME>Types</SHORT-NAME>
    </AR-PACKAGE>
  </AR-PACKAGES>
</AUTOSAR>
"#;

fn connector_document(provider_body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<AUTOSAR>
  <AR-PACKAGES>
    <AR-PACKAGE UUID="pkg-1">
      <SHORT-NAME>Pkg</SHORT-NAME>
      <ELEMENTS>
        <APPLICATION-SW-COMPONENT-TYPE UUID="comp-1">
          <SHORT-NAME>Sensor</SHORT-NAME>
          <PORTS>
            <P-PORT-PROTOTYPE UUID="pport-1">
              <SHORT-NAME>Out</SHORT-NAME>
            </P-PORT-PROTOTYPE>
          </PORTS>
        </APPLICATION-SW-COMPONENT-TYPE>
        <COMPOSITION-SW-COMPONENT-TYPE UUID="comp-top">
          <SHORT-NAME>Top</SHORT-NAME>
          <COMPONENTS>
            <SW-COMPONENT-PROTOTYPE UUID="proto-1">
              <SHORT-NAME>SensorInst</SHORT-NAME>
              <TYPE-TREF DEST="APPLICATION-SW-COMPONENT-TYPE">/Pkg/Sensor</TYPE-TREF>
            </SW-COMPONENT-PROTOTYPE>
          </COMPONENTS>
          <CONNECTORS>
            <ASSEMBLY-SW-CONNECTOR UUID="conn-1">
              <SHORT-NAME>SensorToBus</SHORT-NAME>
              <PROVIDER-IREF>
{provider_body}
              </PROVIDER-IREF>
            </ASSEMBLY-SW-CONNECTOR>
          </CONNECTORS>
        </COMPOSITION-SW-COMPONENT-TYPE>
      </ELEMENTS>
    </AR-PACKAGE>
  </AR-PACKAGES>
</AUTOSAR>
"#
    )
}

const PROVIDER_REFS: &str = r#"<CONTEXT-COMPONENT-REF DEST="SW-COMPONENT-PROTOTYPE">/Pkg/Top/SensorInst</CONTEXT-COMPONENT-REF>
<TARGET-P-PORT-REF DEST="P-PORT-PROTOTYPE">/Pkg/Sensor/Out</TARGET-P-PORT-REF>"#;

/// Connector whose provider references sit directly in the `-IREF` wrapper.
pub fn indirect_one_level_arxml() -> String {
    connector_document(PROVIDER_REFS)
}

/// Connector whose provider references sit inside a nested
/// `-INSTANCE-REF` element, the schema's instance-reference nesting.
pub fn indirect_two_level_arxml() -> String {
    connector_document(&format!(
        "<P-PORT-IN-COMPOSITION-INSTANCE-REF>{}</P-PORT-IN-COMPOSITION-INSTANCE-REF>",
        PROVIDER_REFS
    ))
}
