use std::cell::RefCell;
use std::fs::File;
use std::io::{Read, Write};
use std::rc::Rc;

use foxlite::{parse, Interpreter};
use walkdir::WalkDir;

// Output of a program followed by the error that stopped it, if any
fn run(src: &str) -> String {
    let program = match parse(src) {
        Ok(program) => program,
        Err(errs) => {
            return errs.into_iter().fold(String::new(), |mut acc, err| {
                acc.push_str(&err.to_string());
                acc.push('\n');
                acc
            })
        }
    };

    let output: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
    let stdout: Rc<RefCell<dyn Write>> = output.clone();
    let mut interpreter = Interpreter::new(stdout);
    let result = interpreter.interpret(&program);

    let mut printed = String::from(std::str::from_utf8(&output.borrow()).unwrap());
    if let Err(err) = result {
        printed.push_str(&err.to_string());
        printed.push('\n');
    }
    printed
}

#[test]
fn test_programs() {
    let source_files = WalkDir::new("../tests")
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| matches!(entry.path().extension(), Some(extension) if extension == "prg"))
        .filter_map(|entry| {
            let mut exp_filename = entry.file_name().to_os_string();
            exp_filename.push(".out");

            let parent = entry.path().parent().unwrap();
            let exp_filepath = parent.join(exp_filename);

            if exp_filepath.exists() {
                Some((entry, exp_filepath))
            } else {
                None
            }
        });

    let mut total = 0;

    for (src_path, exp_path) in source_files {
        println!("🕑 Running test: {}", src_path.path().display());

        let mut src_content = String::new();
        let mut exp_content = String::new();

        File::open(src_path.path())
            .unwrap()
            .read_to_string(&mut src_content)
            .unwrap();
        File::open(exp_path)
            .unwrap()
            .read_to_string(&mut exp_content)
            .unwrap();

        assert_eq!(
            exp_content,
            run(&src_content),
            "unexpected output for {}",
            src_path.path().display()
        );

        println!("✅ Test complete: {}", src_path.path().display());
        total += 1;
    }

    assert!(total > 0, "no programs found under ../tests");
    println!("✅ Ran {} tests", total)
}
