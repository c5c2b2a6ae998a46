//! Shared fixtures for integration tests: realistic before/after pairs per
//! category, each substantive enough to pass the change validator.

use quarry::{Category, CommitRecord, FileDiff};

pub const SQL_BEFORE: &str = r#"public List<User> find(String name) throws SQLException {
    Statement stmt = conn.createStatement();
    ResultSet rs = stmt.executeQuery("SELECT * FROM users WHERE name = '" + name + "'");
    return mapUsers(rs);
}"#;

pub const SQL_AFTER: &str = r#"public List<User> find(String name) throws SQLException {
    if (name == null || name.isEmpty()) {
        return Collections.emptyList();
    }
    PreparedStatement stmt = conn.prepareStatement("SELECT * FROM users WHERE name = ?");
    stmt.setString(1, name);
    ResultSet rs = stmt.executeQuery();
    return mapUsers(rs);
}"#;

pub const XSS_BEFORE: &str = r#"protected void doGet(HttpServletRequest request, HttpServletResponse response) throws IOException {
    PrintWriter out = response.getWriter();
    out.println("<h1>Hello " + request.getParameter("name") + "</h1>");
}"#;

pub const XSS_AFTER: &str = r#"protected void doGet(HttpServletRequest request, HttpServletResponse response) throws IOException {
    PrintWriter out = response.getWriter();
    String name = StringEscapeUtils.escapeHtml4(request.getParameter("name"));
    if (name == null) { name = "guest"; }
    out.println("<h1>Hello " + name + "</h1>");
}"#;

pub const CMD_BEFORE: &str = r#"public String ping(HttpServletRequest request) throws IOException {
    String host = request.getParameter("host");
    Process p = Runtime.getRuntime().exec("ping -c 1 " + host);
    return readAll(p.getInputStream());
}"#;

pub const CMD_AFTER: &str = r#"public String ping(HttpServletRequest request) throws IOException {
    String host = request.getParameter("host");
    if (!StringUtils.isAlphanumeric(host)) {
        throw new IllegalArgumentException("bad host");
    }
    Process p = new ProcessBuilder(Arrays.asList("ping", "-c", "1", host)).start();
    return readAll(p.getInputStream());
}"#;

pub const PATH_BEFORE: &str = r#"public byte[] download(String name) throws IOException {
    File file = new File(baseDir + "/" + name);
    return Files.readAllBytes(file.toPath());
}"#;

pub const PATH_AFTER: &str = r#"public byte[] download(String name) throws IOException {
    File file = new File(baseDir, FilenameUtils.getName(name));
    String canonical = file.getCanonicalPath();
    if (!canonical.startsWith(baseDir)) {
        throw new SecurityException("outside base directory");
    }
    return Files.readAllBytes(file.toPath());
}"#;

pub const DESER_BEFORE: &str = r#"public Command read(InputStream raw) throws Exception {
    ObjectInputStream in = new ObjectInputStream(raw);
    return (Command) in.readObject();
}"#;

pub const DESER_AFTER: &str = r#"public Command read(InputStream raw) throws Exception {
    ObjectInputStream in = new ObjectInputStream(raw);
    in.setObjectInputFilter(ObjectInputFilter.Config.createFilter("app.Command;!*"));
    Object value = in.readUnshared();
    if (!(value instanceof Command)) {
        throw new InvalidObjectException("unexpected payload");
    }
    return (Command) value;
}"#;

/// Message and before/after templates for one category
pub fn templates(category: Category) -> (&'static str, &'static str, &'static str) {
    match category {
        Category::SqlInjection => {
            ("fix sql injection in user lookup, bug: 1001", SQL_BEFORE, SQL_AFTER)
        }
        Category::CrossSiteScripting => {
            ("escape html output in greeting page (bug: 2002)", XSS_BEFORE, XSS_AFTER)
        }
        Category::CommandInjection => {
            ("fix command injection in ping endpoint, closes #3003", CMD_BEFORE, CMD_AFTER)
        }
        Category::PathTraversal => {
            ("prevent directory traversal in download api, bug: 4004", PATH_BEFORE, PATH_AFTER)
        }
        Category::InsecureDeserialization => {
            ("harden object input deserialization, CVE-2019-5005", DESER_BEFORE, DESER_AFTER)
        }
    }
}

/// A commit whose snippet is made unique by weaving `index` into an
/// identifier, so content hashes never collide across commits
pub fn commit_for(category: Category, index: usize) -> CommitRecord {
    let (message, before, after) = templates(category);
    let marker = format!("handler{}{index}", category.key().replace('_', ""));
    CommitRecord {
        hash: format!("{:040x}", index * 31 + category as usize + 1),
        repo: "demo-webapp".to_string(),
        message: message.to_string(),
        files: vec![FileDiff {
            path: format!("src/main/java/app/Endpoint{index}.java"),
            before: format!("// {marker}\n{before}\nvoid {marker}() {{ audit(\"{marker}\"); }}"),
            after: format!("{after}\nvoid {marker}() {{ audit(\"{marker}\"); }}"),
        }],
    }
}

/// A JSONL dump with `per_category` commits of every category
pub fn jsonl_dump(per_category: usize) -> String {
    let mut lines = Vec::new();
    for category in Category::ALL {
        for index in 0..per_category {
            let record = commit_for(category, index);
            lines.push(serde_json::to_string(&record).unwrap());
        }
    }
    lines.join("\n")
}
