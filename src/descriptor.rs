use std::fmt::{self, Display};

use winnow::combinator::{alt, delimited, dispatch, empty, fail, opt, peek, preceded, repeat};
use winnow::token::{any, take_till, take_while};
use winnow::{PResult, Parser};

use crate::error::ParseError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BaseType<'a> {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
    Object(&'a str),
}

impl BaseType<'_> {
    pub fn to_descriptor(&self) -> String {
        let code = match self {
            BaseType::Byte => "B",
            BaseType::Char => "C",
            BaseType::Double => "D",
            BaseType::Float => "F",
            BaseType::Int => "I",
            BaseType::Long => "J",
            BaseType::Short => "S",
            BaseType::Boolean => "Z",
            BaseType::Object(name) => return format!("L{name};"),
        };
        code.to_owned()
    }
}

impl Display for BaseType<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseType::Byte => f.write_str("byte"),
            BaseType::Char => f.write_str("char"),
            BaseType::Double => f.write_str("double"),
            BaseType::Float => f.write_str("float"),
            BaseType::Int => f.write_str("int"),
            BaseType::Long => f.write_str("long"),
            BaseType::Short => f.write_str("short"),
            BaseType::Boolean => f.write_str("boolean"),
            BaseType::Object(name) => f.write_str(&java_name(name)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldType<'a> {
    Base(BaseType<'a>),
    Array(usize, BaseType<'a>),
}

impl FieldType<'_> {
    pub fn to_descriptor(&self) -> String {
        match self {
            FieldType::Base(base) => base.to_descriptor(),
            FieldType::Array(depth, base) => "[".repeat(*depth) + &base.to_descriptor(),
        }
    }
}

/// Java source form, e.g. `java.lang.String[][]`.
impl Display for FieldType<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Base(base) => write!(f, "{base}"),
            FieldType::Array(depth, base) => write!(f, "{base}{}", "[]".repeat(*depth)),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct MethodDescriptor<'a> {
    pub params: Vec<FieldType<'a>>,
    /// `None` for `void`.
    pub return_type: Option<FieldType<'a>>,
}

impl MethodDescriptor<'_> {
    pub fn to_descriptor(&self) -> String {
        let params: String = self.params.iter().map(FieldType::to_descriptor).collect();
        let return_type = self
            .return_type
            .as_ref()
            .map_or_else(|| "V".to_owned(), FieldType::to_descriptor);
        format!("({params}){return_type}")
    }
}

/// A type as it appears in a generic signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JavaType<'a> {
    Primitive(BaseType<'a>),
    Class(ClassType<'a>),
    TypeVariable(&'a str),
    Array(Box<JavaType<'a>>),
}

impl Display for JavaType<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JavaType::Primitive(base) => write!(f, "{base}"),
            JavaType::Class(class) => write!(f, "{class}"),
            JavaType::TypeVariable(name) => f.write_str(name),
            JavaType::Array(element) => write!(f, "{element}[]"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassType<'a> {
    /// Set for `Outer<T>.Inner` forms, where the outer class is parameterized.
    pub outer: Option<Box<ClassType<'a>>>,
    pub name: &'a str,
    pub type_args: Vec<TypeArgument<'a>>,
}

impl Display for ClassType<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outer {
            Some(outer) => write!(f, "{outer}.{}", self.name)?,
            None => f.write_str(&java_name(self.name))?,
        }
        if !self.type_args.is_empty() {
            write!(f, "<{}>", join(&self.type_args))?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeArgument<'a> {
    Any,
    Extends(JavaType<'a>),
    Super(JavaType<'a>),
    Exact(JavaType<'a>),
}

impl Display for TypeArgument<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeArgument::Any => f.write_str("?"),
            TypeArgument::Extends(bound) => write!(f, "? extends {bound}"),
            TypeArgument::Super(bound) => write!(f, "? super {bound}"),
            TypeArgument::Exact(ty) => write!(f, "{ty}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeParameter<'a> {
    pub name: &'a str,
    pub class_bound: Option<JavaType<'a>>,
    pub interface_bounds: Vec<JavaType<'a>>,
}

impl Display for TypeParameter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)?;
        let mut sep = " extends ";
        for bound in self.class_bound.iter().chain(&self.interface_bounds) {
            write!(f, "{sep}{bound}")?;
            sep = " & ";
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ClassSignature<'a> {
    pub type_params: Vec<TypeParameter<'a>>,
    pub superclass: ClassType<'a>,
    pub interfaces: Vec<ClassType<'a>>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct MethodSignature<'a> {
    pub type_params: Vec<TypeParameter<'a>>,
    pub params: Vec<JavaType<'a>>,
    pub return_type: Option<JavaType<'a>>,
    pub throws: Vec<JavaType<'a>>,
}

/// `<A, B extends C>`, or nothing when there are no type parameters.
pub fn type_params_to_string(params: &[TypeParameter]) -> String {
    if params.is_empty() {
        String::new()
    } else {
        format!("<{}>", join(params))
    }
}

/// Converts an internal class name to its dotted form.
pub fn java_name(internal: &str) -> String {
    internal.replace('/', ".")
}

fn join<T: Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn malformed(descriptor: &str) -> ParseError {
    ParseError::MalformedDescriptor {
        descriptor: descriptor.to_owned(),
    }
}

pub fn parse_field_descriptor(descriptor: &str) -> Result<FieldType, ParseError> {
    field_type.parse(descriptor).map_err(|_| malformed(descriptor))
}

pub fn parse_method_descriptor(descriptor: &str) -> Result<MethodDescriptor, ParseError> {
    let (params, return_type) = (params_types, return_type)
        .parse(descriptor)
        .map_err(|_| malformed(descriptor))?;

    Ok(MethodDescriptor {
        params,
        return_type,
    })
}

pub fn parse_field_signature(signature: &str) -> Result<JavaType, ParseError> {
    reference_type.parse(signature).map_err(|_| malformed(signature))
}

pub fn parse_class_signature(signature: &str) -> Result<ClassSignature, ParseError> {
    (type_parameters, class_type, repeat(0.., class_type))
        .map(|(type_params, superclass, interfaces)| ClassSignature {
            type_params,
            superclass,
            interfaces,
        })
        .parse(signature)
        .map_err(|_| malformed(signature))
}

pub fn parse_method_signature(signature: &str) -> Result<MethodSignature, ParseError> {
    (
        type_parameters,
        delimited('(', repeat(0.., java_type), ')'),
        alt(('V'.map(|_| None), java_type.map(Some))),
        repeat(0.., preceded('^', reference_type)),
    )
        .map(|(type_params, params, return_type, throws)| MethodSignature {
            type_params,
            params,
            return_type,
            throws,
        })
        .parse(signature)
        .map_err(|_| malformed(signature))
}

fn primitive<'s>(input: &mut &'s str) -> PResult<BaseType<'s>> {
    dispatch! { any;
        'B' => empty.map(|_| BaseType::Byte),
        'C' => empty.map(|_| BaseType::Char),
        'D' => empty.map(|_| BaseType::Double),
        'F' => empty.map(|_| BaseType::Float),
        'I' => empty.map(|_| BaseType::Int),
        'J' => empty.map(|_| BaseType::Long),
        'S' => empty.map(|_| BaseType::Short),
        'Z' => empty.map(|_| BaseType::Boolean),
        _ => fail,
    }
    .parse_next(input)
}

fn base_type<'s>(input: &mut &'s str) -> PResult<BaseType<'s>> {
    alt((
        delimited('L', take_till(1.., ';'), ';').map(BaseType::Object),
        primitive,
    ))
    .parse_next(input)
}

fn array_type<'s>(input: &mut &'s str) -> PResult<(usize, BaseType<'s>)> {
    let depth = take_while(1.., '[').map(|v: &str| v.len());
    (depth, base_type).parse_next(input)
}

fn field_type<'s>(input: &mut &'s str) -> PResult<FieldType<'s>> {
    alt((
        base_type.map(FieldType::Base),
        array_type.map(|(depth, ty)| FieldType::Array(depth, ty)),
    ))
    .parse_next(input)
}

fn params_types<'s>(input: &mut &'s str) -> PResult<Vec<FieldType<'s>>> {
    delimited('(', repeat(.., field_type), ')').parse_next(input)
}

fn return_type<'s>(input: &mut &'s str) -> PResult<Option<FieldType<'s>>> {
    alt(('V'.map(|_| None), field_type.map(Some))).parse_next(input)
}

fn identifier<'s>(input: &mut &'s str) -> PResult<&'s str> {
    take_till(1.., ['.', ';', '[', '/', '<', '>', ':']).parse_next(input)
}

fn java_type<'s>(input: &mut &'s str) -> PResult<JavaType<'s>> {
    alt((reference_type, primitive.map(JavaType::Primitive))).parse_next(input)
}

fn reference_type<'s>(input: &mut &'s str) -> PResult<JavaType<'s>> {
    dispatch! { peek(any);
        'L' => class_type.map(JavaType::Class),
        'T' => delimited('T', identifier, ';').map(JavaType::TypeVariable),
        '[' => preceded('[', java_type).map(|ty| JavaType::Array(Box::new(ty))),
        _ => fail,
    }
    .parse_next(input)
}

fn class_type<'s>(input: &mut &'s str) -> PResult<ClassType<'s>> {
    // The package path keeps its slashes
    let name = preceded('L', take_till(1.., ['.', ';', '[', '<', '>', ':'])).parse_next(input)?;
    let mut class = ClassType {
        outer: None,
        name,
        type_args: type_arguments.parse_next(input)?,
    };

    while let Some(name) = opt(preceded('.', identifier)).parse_next(input)? {
        class = ClassType {
            outer: Some(Box::new(class)),
            name,
            type_args: type_arguments.parse_next(input)?,
        };
    }

    ';'.parse_next(input)?;
    Ok(class)
}

fn type_arguments<'s>(input: &mut &'s str) -> PResult<Vec<TypeArgument<'s>>> {
    opt(delimited('<', repeat(1.., type_argument), '>'))
        .map(Option::unwrap_or_default)
        .parse_next(input)
}

fn type_argument<'s>(input: &mut &'s str) -> PResult<TypeArgument<'s>> {
    dispatch! { peek(any);
        '*' => '*'.map(|_| TypeArgument::Any),
        '+' => preceded('+', reference_type).map(TypeArgument::Extends),
        '-' => preceded('-', reference_type).map(TypeArgument::Super),
        _ => reference_type.map(TypeArgument::Exact),
    }
    .parse_next(input)
}

fn type_parameters<'s>(input: &mut &'s str) -> PResult<Vec<TypeParameter<'s>>> {
    opt(delimited('<', repeat(1.., type_parameter), '>'))
        .map(Option::unwrap_or_default)
        .parse_next(input)
}

fn type_parameter<'s>(input: &mut &'s str) -> PResult<TypeParameter<'s>> {
    (
        identifier,
        preceded(':', opt(reference_type)),
        repeat(0.., preceded(':', reference_type)),
    )
        .map(|(name, class_bound, interface_bounds)| TypeParameter {
            name,
            class_bound,
            interface_bounds,
        })
        .parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_descriptors() {
        assert_eq!(
            parse_field_descriptor("I").unwrap(),
            FieldType::Base(BaseType::Int)
        );
        assert_eq!(
            parse_field_descriptor("[[Ljava/lang/String;").unwrap(),
            FieldType::Array(2, BaseType::Object("java/lang/String"))
        );
        assert_eq!(
            parse_field_descriptor("[[Ljava/lang/String;")
                .unwrap()
                .to_string(),
            "java.lang.String[][]"
        );
        assert_eq!(
            parse_field_descriptor("LOuter$Inner;").unwrap().to_string(),
            "Outer$Inner"
        );
    }

    #[test]
    fn method_descriptors() {
        let descriptor = parse_method_descriptor("(IJ[DLjava/lang/Object;)V").unwrap();
        let params: Vec<_> = descriptor.params.iter().map(ToString::to_string).collect();

        assert_eq!(params, ["int", "long", "double[]", "java.lang.Object"]);
        assert_eq!(descriptor.return_type, None);

        let descriptor = parse_method_descriptor("()[Z").unwrap();
        assert!(descriptor.params.is_empty());
        assert_eq!(
            descriptor.return_type,
            Some(FieldType::Array(1, BaseType::Boolean))
        );
    }

    #[test]
    fn descriptors_round_trip() {
        for descriptor in ["Z", "[[[J", "Ljava/util/Map$Entry;", "[Ljava/lang/Object;"] {
            assert_eq!(
                parse_field_descriptor(descriptor).unwrap().to_descriptor(),
                descriptor
            );
        }
        for descriptor in ["()V", "(BCSIJFDZ)Ljava/lang/String;", "([[I[Ljava/lang/Object;)[B"] {
            assert_eq!(
                parse_method_descriptor(descriptor).unwrap().to_descriptor(),
                descriptor
            );
        }
    }

    #[test]
    fn malformed_descriptors() {
        for descriptor in ["", "Q", "L;", "Ljava/lang/String", "II", "[", "V"] {
            assert_eq!(
                parse_field_descriptor(descriptor),
                Err(ParseError::MalformedDescriptor {
                    descriptor: descriptor.to_owned()
                }),
                "{descriptor:?}"
            );
        }
        for descriptor in ["(V)V", "()", "(I", "I)V", "()VV"] {
            assert!(parse_method_descriptor(descriptor).is_err(), "{descriptor:?}");
        }
    }

    #[test]
    fn class_signature() {
        let signature = parse_class_signature(
            "<T:Ljava/lang/Object;U::Ljava/lang/Comparable<-TU;>;>Ljava/lang/Object;Ljava/lang/Iterable<TT;>;",
        )
        .unwrap();

        assert_eq!(
            type_params_to_string(&signature.type_params),
            "<T extends java.lang.Object, U extends java.lang.Comparable<? super U>>"
        );
        assert_eq!(signature.superclass.to_string(), "java.lang.Object");
        assert_eq!(signature.interfaces.len(), 1);
        assert_eq!(signature.interfaces[0].to_string(), "java.lang.Iterable<T>");
    }

    #[test]
    fn method_signature() {
        let signature = parse_method_signature(
            "<X:Ljava/lang/Exception;>(Ljava/util/Map<TK;+Ljava/util/List<TV;>;>;[TK;I)TV;^TX;^Ljava/io/IOException;",
        )
        .unwrap();
        let params: Vec<_> = signature.params.iter().map(ToString::to_string).collect();
        let throws: Vec<_> = signature.throws.iter().map(ToString::to_string).collect();

        assert_eq!(
            type_params_to_string(&signature.type_params),
            "<X extends java.lang.Exception>"
        );
        assert_eq!(
            params,
            ["java.util.Map<K, ? extends java.util.List<V>>", "K[]", "int"]
        );
        assert_eq!(signature.return_type, Some(JavaType::TypeVariable("V")));
        assert_eq!(throws, ["X", "java.io.IOException"]);
    }

    #[test]
    fn nested_and_wildcard_signatures() {
        let ty = parse_field_signature("LOuter<TT;>.Inner<*>;").unwrap();
        assert_eq!(ty.to_string(), "Outer<T>.Inner<?>");

        let ty = parse_field_signature("[Ljava/util/List<[I>;").unwrap();
        assert_eq!(ty.to_string(), "java.util.List<int[]>[]");
    }

    #[test]
    fn malformed_signatures() {
        assert!(parse_field_signature("I").is_err());
        assert!(parse_field_signature("Ljava/util/List<>;").is_err());
        assert!(parse_class_signature("<T>Ljava/lang/Object;").is_err());
        assert!(parse_method_signature("()").is_err());
    }
}
