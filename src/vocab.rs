//! Well-known namespace IRIs used across the engine.

pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const SH_NS: &str = "http://www.w3.org/ns/shacl#";
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDF_FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
pub const RDF_REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
pub const RDF_NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
pub const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";

pub const RDFS_SUBCLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
pub const RDFS_SUBPROPERTY_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subPropertyOf";

pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const XSD_DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
pub const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";

/// SHACL terms, prefixed `sh:`.
pub mod sh {
    pub const NODE_SHAPE: &str = "http://www.w3.org/ns/shacl#NodeShape";
    pub const TARGET_CLASS: &str = "http://www.w3.org/ns/shacl#targetClass";
    pub const PROPERTY: &str = "http://www.w3.org/ns/shacl#property";
    pub const PATH: &str = "http://www.w3.org/ns/shacl#path";
    pub const NAME: &str = "http://www.w3.org/ns/shacl#name";
    pub const MIN_COUNT: &str = "http://www.w3.org/ns/shacl#minCount";
    pub const MAX_COUNT: &str = "http://www.w3.org/ns/shacl#maxCount";
    pub const DATATYPE: &str = "http://www.w3.org/ns/shacl#datatype";
    pub const CLASS: &str = "http://www.w3.org/ns/shacl#class";
    pub const PATTERN: &str = "http://www.w3.org/ns/shacl#pattern";
    pub const FLAGS: &str = "http://www.w3.org/ns/shacl#flags";
    pub const IN: &str = "http://www.w3.org/ns/shacl#in";

    pub const RULE: &str = "http://www.w3.org/ns/shacl#rule";
    pub const SPARQL_RULE: &str = "http://www.w3.org/ns/shacl#SPARQLRule";
    pub const CONSTRUCT: &str = "http://www.w3.org/ns/shacl#construct";
    pub const ORDER: &str = "http://www.w3.org/ns/shacl#order";
    pub const DEACTIVATED: &str = "http://www.w3.org/ns/shacl#deactivated";
    pub const PREFIXES: &str = "http://www.w3.org/ns/shacl#prefixes";
    pub const DECLARE: &str = "http://www.w3.org/ns/shacl#declare";
    pub const PREFIX: &str = "http://www.w3.org/ns/shacl#prefix";
    pub const NAMESPACE: &str = "http://www.w3.org/ns/shacl#namespace";

    pub const VALIDATION_REPORT: &str = "http://www.w3.org/ns/shacl#ValidationReport";
    pub const VALIDATION_RESULT: &str = "http://www.w3.org/ns/shacl#ValidationResult";
    pub const CONFORMS: &str = "http://www.w3.org/ns/shacl#conforms";
    pub const RESULT: &str = "http://www.w3.org/ns/shacl#result";
    pub const FOCUS_NODE: &str = "http://www.w3.org/ns/shacl#focusNode";
    pub const RESULT_PATH: &str = "http://www.w3.org/ns/shacl#resultPath";
    pub const RESULT_MESSAGE: &str = "http://www.w3.org/ns/shacl#resultMessage";
    pub const RESULT_SEVERITY: &str = "http://www.w3.org/ns/shacl#resultSeverity";
    pub const SOURCE_SHAPE: &str = "http://www.w3.org/ns/shacl#sourceShape";
    pub const SOURCE_CONSTRAINT_COMPONENT: &str =
        "http://www.w3.org/ns/shacl#sourceConstraintComponent";
    pub const VALUE: &str = "http://www.w3.org/ns/shacl#value";
    pub const VIOLATION: &str = "http://www.w3.org/ns/shacl#Violation";
}
