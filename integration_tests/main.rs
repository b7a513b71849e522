mod builder;

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::Command;

use libtest_mimic::{Arguments, Failed, Trial};
use rusty_javap::{disassemble, disassemble_file, ParseError};

use crate::builder::ClassBuilder;

fn main() {
    let args = Arguments::from_args();

    let mut tests = vec![
        Trial::test("minimal_class", || {
            let output = disassemble(&minimal_class())?;
            insta::assert_snapshot!("minimal_class", output);
            Ok(())
        }),
        Trial::test("tableswitch_key_gap", || {
            let output = disassemble(&tableswitch_class())?;
            insta::assert_snapshot!("tableswitch_key_gap", output);
            Ok(())
        }),
        Trial::test("interface_members", || {
            let output = disassemble(&interface_class())?;
            insta::assert_snapshot!("interface_members", output);
            Ok(())
        }),
        Trial::test("javap_version_parsing", || {
            let versions = [("17.0.9\n", Some(17)), ("21-ea\n", Some(21)), ("", None)];
            for (version, expected) in versions {
                if javap_major_version(version) != expected {
                    return Err(format!("{version:?} did not parse as {expected:?}").into());
                }
            }
            Ok(())
        }),
        Trial::test("output_is_deterministic", || {
            let bytes = minimal_class();
            if disassemble(&bytes)? != disassemble(&bytes)? {
                return Err("two runs over the same bytes differ".into());
            }
            Ok(())
        }),
        Trial::test("every_truncation_fails", || {
            for bytes in [minimal_class(), tableswitch_class(), interface_class()] {
                for len in 0..bytes.len() {
                    if disassemble(&bytes[..len]).is_ok() {
                        return Err(format!("prefix of {len} bytes was accepted").into());
                    }
                }
            }
            Ok(())
        }),
        Trial::test("inflated_pool_count_fails", || {
            let class = minimal_builder();
            let bytes = class.build_with_pool_count(class.pool_count() + 1);
            // the extra entry is read from the access flags, whose first byte is 0
            expect_error(
                disassemble(&bytes),
                ParseError::UnknownConstantTag {
                    tag: 0,
                    index: class.pool_count(),
                },
            )
        }),
        Trial::test("phantom_slot_is_dangling", || {
            let mut class = ClassBuilder::new(0x0021, "Phantom", "java/lang/Object");
            let long = class.long(1 << 40);
            class.class_at(long + 1);
            match disassemble(&class.build()) {
                Err(ParseError::DanglingReference { index, .. }) if index == long + 1 => Ok(()),
                other => Err(format!("expected a dangling #{}, got {other:?}", long + 1).into()),
            }
        }),
    ];

    tests.extend(oracle_trials());

    libtest_mimic::run(&args, tests).exit();
}

fn expect_error(result: Result<String, ParseError>, expected: ParseError) -> Result<(), Failed> {
    match result {
        Err(e) if e == expected => Ok(()),
        other => Err(format!("expected {expected:?}, got {other:?}").into()),
    }
}

fn minimal_builder() -> ClassBuilder {
    let mut class = ClassBuilder::new(0x0021, "Minimal", "java/lang/Object");
    let object_init = class.method_ref("java/lang/Object", "<init>", "()V");
    let out = class.field_ref("java/lang/System", "out", "Ljava/io/PrintStream;");
    let hello = class.string("hello");
    let println = class.method_ref("java/io/PrintStream", "println", "(Ljava/lang/String;)V");

    let lines = class.line_numbers(&[(0, 1)]);
    let code = [&[0x2a, 0xb7][..], &object_init.to_be_bytes(), &[0xb1]].concat();
    let code = class.code(1, 1, &code, vec![lines]);
    class.method(0x0001, "<init>", "()V", vec![code]);

    let lines = class.line_numbers(&[(0, 3), (8, 4)]);
    let code = [
        &[0xb2][..],
        &out.to_be_bytes(),
        &[0x12, hello as u8, 0xb6],
        &println.to_be_bytes(),
        &[0xb1],
    ]
    .concat();
    let code = class.code(2, 1, &code, vec![lines]);
    class.method(0x0009, "main", "([Ljava/lang/String;)V", vec![code]);

    let source_file = class.source_file("Minimal.java");
    class.class_attribute(source_file);
    class
}

fn minimal_class() -> Vec<u8> {
    minimal_builder().build()
}

/// `static int pick(int)` switching over keys 1 to 4, with 3 falling through
/// to the default.
fn tableswitch_class() -> Vec<u8> {
    let mut class = ClassBuilder::new(0x0020, "Switch", "java/lang/Object");

    let mut code = vec![0x1a, 0xaa, 0, 0];
    for value in [37, 1, 4, 31, 33, 37, 35] {
        code.extend_from_slice(&i32::to_be_bytes(value));
    }
    code.extend_from_slice(&[0x04, 0xac, 0x05, 0xac, 0x07, 0xac, 0x02, 0xac]);

    let code = class.code(1, 1, &code, vec![]);
    class.method(0x0008, "pick", "(I)I", vec![code]);
    class.build()
}

/// An interface with a generic default method, an abstract method, a static
/// method and an attribute javap does not know.
fn interface_class() -> Vec<u8> {
    let mut class = ClassBuilder::new(0x0601, "Shape", "java/lang/Object");

    let code = class.code(1, 2, &[0x2b, 0xb0], vec![]);
    let signature = class.signature("<T:Ljava/lang/Object;>(TT;)TT;");
    class.method(
        0x0001,
        "echo",
        "(Ljava/lang/Object;)Ljava/lang/Object;",
        vec![code, signature],
    );

    class.method(0x0401, "area", "()D", vec![]);

    let code = class.code(1, 0, &[0x03, 0xac], vec![]);
    class.method(0x0009, "zero", "()I", vec![code]);

    let marker = class.attribute("Marker", &(0..18).collect::<Vec<u8>>());
    class.class_attribute(marker);
    class.build()
}

/// Trials comparing against the JDK's own javap. They need `javac` and
/// `javap` on the path, so they only run with `--ignored`.
fn oracle_trials() -> Vec<Trial> {
    let tests_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("integration_tests");

    let Ok(entries) = fs::read_dir(&tests_dir) else {
        return vec![];
    };

    let mut sources: Vec<_> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "java"))
        .collect();
    sources.sort();

    sources
        .into_iter()
        .map(|source| {
            let name = source
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or_default()
                .to_owned();
            Trial::test(format!("javap::{name}"), move || compare_with_javap(&name, &source))
                .with_ignored_flag(true)
        })
        .collect()
}

/// Float and double constants use the shortest-digit formatting of JDK 19.
const MIN_JAVAP_VERSION: u32 = 19;

fn compare_with_javap(name: &str, source: &Path) -> Result<(), Failed> {
    let version = run(Command::new("javap").arg("-version"))?;
    let major = javap_major_version(&version)
        .ok_or_else(|| format!("unrecognized javap version {version:?}"))?;
    if major < MIN_JAVAP_VERSION {
        return Err(format!("javap {major} is older than {MIN_JAVAP_VERSION}").into());
    }

    let out_dir = Path::new(env!("CARGO_TARGET_TMPDIR")).join("javap").join(name);
    let stamp = out_dir.join(".stamp");

    if !check_stamp(source, &stamp) {
        eprintln!("{source:?} was modified, recompiling");
        fs::create_dir_all(&out_dir)?;
        run(Command::new("javac").arg("-d").arg(&out_dir).arg(source))?;
        File::create(&stamp)?;
    }

    let mut class_files: Vec<PathBuf> = fs::read_dir(&out_dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "class"))
        .collect();
    class_files.sort();

    for class_file in class_files {
        let expected = run(Command::new("javap").args(["-v", "-l", "-p"]).arg(&class_file))?;
        let actual = disassemble_file(&class_file)?;

        // javap formats the date in the local time zone and locale
        let expected = without_date(&expected);
        let actual = without_date(&actual);
        if expected != actual {
            return Err(format!(
                "{} differs from javap\n--- javap\n{expected}\n--- rusty-javap\n{actual}",
                class_file.display()
            )
            .into());
        }
    }

    Ok(())
}

/// Parses `17.0.9` or `21` into the feature release number.
fn javap_major_version(version: &str) -> Option<u32> {
    version.trim().split(['.', '-', '+']).next()?.parse().ok()
}

fn without_date(listing: &str) -> String {
    listing
        .lines()
        .filter(|line| !line.starts_with("  Last modified "))
        .map(|line| format!("{line}\n"))
        .collect()
}

fn run(command: &mut Command) -> Result<String, Failed> {
    let output = command.output()?;
    if !output.status.success() {
        return Err(format!(
            "{command:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        )
        .into());
    }
    Ok(String::from_utf8(output.stdout)?)
}

fn check_stamp(source: &Path, stamp: &Path) -> bool {
    if !stamp.exists() {
        return false;
    }

    let mtime = source.metadata().unwrap().modified().unwrap();
    let stamp_mtime = stamp.metadata().unwrap().modified().unwrap();

    stamp_mtime > mtime
}
